use std::f64::consts::TAU;
use std::time::Instant;

use indextree::{Arena, NodeId};

use crate::tree::TreeNode;

/// Partition coordinates of one arc: angular span `[x0, x1]` in radians and
/// radial band `[y0, y1]` in depth units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcSpan {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl ArcSpan {
    pub fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// Angular width in radians.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn is_degenerate(&self) -> bool {
        self.x1 <= self.x0
    }

    /// Linear interpolation of all four boundaries.
    pub fn lerp(&self, to: &ArcSpan, t: f64) -> ArcSpan {
        ArcSpan {
            x0: self.x0 + (to.x0 - self.x0) * t,
            x1: self.x1 + (to.x1 - self.x1) * t,
            y0: self.y0 + (to.y0 - self.y0) * t,
            y1: self.y1 + (to.y1 - self.y1) * t,
        }
    }

    /// Widen the angular span to cover `other` as well.
    pub fn merge_angle(&mut self, other: &ArcSpan) {
        self.x0 = self.x0.min(other.x0);
        self.x1 = self.x1.max(other.x1);
    }

    /// Express this span relative to `focus` so that the focus span fills
    /// the whole circle and its depth becomes the center.
    pub fn renormalized(&self, focus: &ArcSpan, focus_depth: usize) -> ArcSpan {
        let w = focus.width();
        let project = |x: f64| {
            if w > 0.0 {
                ((x - focus.x0) / w).clamp(0.0, 1.0) * TAU
            } else {
                0.0
            }
        };
        let d = focus_depth as f64;
        ArcSpan {
            x0: project(self.x0),
            x1: project(self.x1),
            y0: (self.y0 - d).max(0.0),
            y1: (self.y1 - d).max(0.0),
        }
    }
}

/// A node of the radial partition.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub name: String,
    pub depth: usize,
    /// Sum of leaf sizes in the subtree
    pub value: f64,
    pub has_children: bool,
    /// Layout span computed by the partition (never animated)
    pub span: ArcSpan,
    /// Geometry on screen / animating from
    pub current: ArcSpan,
    /// Geometry to animate toward
    pub target: ArcSpan,
    /// Index path of the originating input node
    pub source: Vec<usize>,
}

/// Radial partition of a tree, stored in an arena. Parent links are arena
/// indices, so upward walks never re-traverse the tree.
pub struct LayoutTree {
    arena: Arena<LayoutNode>,
    root: NodeId,
    height: usize,
}

/// Build the radial partition for `tree`.
pub fn build_layout(tree: &TreeNode) -> LayoutTree {
    LayoutTree::build(tree)
}

impl LayoutTree {
    pub fn build(tree: &TreeNode) -> Self {
        let started = Instant::now();
        let mut arena = Arena::new();
        let (root, height) = insert_sorted(&mut arena, tree);

        let mut layout = Self { arena, root, height };
        layout.partition();

        tracing::debug!(
            nodes = layout.len(),
            height = layout.height,
            value = layout.node(root).value,
            "built layout in {:.2?}",
            started.elapsed()
        );
        layout
    }

    /// Assign angular spans top-down: children split the parent's span in
    /// proportion to their value, in their (already sorted) order.
    fn partition(&mut self) {
        {
            let root = self.node_mut(self.root);
            root.span = ArcSpan::new(0.0, TAU, 0.0, 1.0);
        }

        let order: Vec<NodeId> = self.root.descendants(&self.arena).collect();
        for id in order {
            let (parent_span, parent_value) = {
                let node = self.node(id);
                (node.span, node.value)
            };
            let children: Vec<NodeId> = id.children(&self.arena).collect();
            let Some(&last) = children.last() else {
                continue;
            };

            let width = parent_span.width();
            let mut acc = 0.0;
            for &child in &children {
                let node = self.node_mut(child);
                let y0 = node.depth as f64;
                let x0 = parent_span.x0 + frac(acc, parent_value) * width;
                acc += node.value;
                let x1 = if parent_value <= 0.0 {
                    x0
                } else if child == last {
                    parent_span.x1
                } else {
                    parent_span.x0 + frac(acc, parent_value) * width
                };
                node.span = ArcSpan::new(x0, x1, y0, y0 + 1.0);
            }
        }

        for node in self.arena.iter_mut() {
            let data = node.get_mut();
            data.current = data.span;
            data.target = data.span;
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &Arena<LayoutNode> {
        &self.arena
    }

    /// Deepest depth in the tree (root = 0).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of nodes, root included.
    pub(crate) fn len(&self) -> usize {
        self.arena.count()
    }

    pub fn node(&self, id: NodeId) -> &LayoutNode {
        self.arena[id].get()
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut LayoutNode {
        self.arena[id].get_mut()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// All nodes in pre-order, root first.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.descendants(&self.arena)
    }

    /// The depth-1 ancestor of `id` (itself when at depth 1); `None` for root.
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        id.ancestors(&self.arena)
            .find(|&a| self.node(a).depth == 1)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants().find(|&id| self.node(id).name == name)
    }
}

fn frac(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}

/// A node whose children are still being inserted.
struct Pending<'a> {
    tree: &'a TreeNode,
    id: NodeId,
    next_child: usize,
    children: Vec<(NodeId, f64)>,
}

impl<'a> Pending<'a> {
    fn new(tree: &'a TreeNode, id: NodeId) -> Self {
        Self {
            tree,
            id,
            next_child: 0,
            children: Vec::with_capacity(tree.children.len()),
        }
    }
}

impl LayoutNode {
    fn unplaced(tree: &TreeNode, depth: usize, source: Vec<usize>) -> Self {
        Self {
            name: tree.name.clone(),
            depth,
            value: 0.0,
            has_children: !tree.is_leaf(),
            span: ArcSpan::default(),
            current: ArcSpan::default(),
            target: ArcSpan::default(),
            source,
        }
    }
}

/// Insert `tree` and its subtree into the arena, children sorted by value
/// descending (stable, so equal values keep input order). Returns the root
/// and the deepest depth. Walks with an explicit stack, so input depth is
/// not bounded by the call stack.
fn insert_sorted(arena: &mut Arena<LayoutNode>, tree: &TreeNode) -> (NodeId, usize) {
    let root = arena.new_node(LayoutNode::unplaced(tree, 0, Vec::new()));
    let mut stack = vec![Pending::new(tree, root)];
    let mut height = 0;

    while let Some(top) = stack.last_mut() {
        let node = top.tree;
        if let Some(child) = node.children.get(top.next_child) {
            let parent = arena[top.id].get();
            let depth = parent.depth + 1;
            let mut source = parent.source.clone();
            source.push(top.next_child);
            top.next_child += 1;

            height = height.max(depth);
            let id = arena.new_node(LayoutNode::unplaced(child, depth, source));
            stack.push(Pending::new(child, id));
            continue;
        }

        let Some(Pending { tree: done, id, mut children, .. }) = stack.pop() else {
            break;
        };

        // Interior sizes are never trusted
        let value = if done.is_leaf() {
            done.weight()
        } else {
            children.iter().map(|(_, v)| v).sum()
        };
        arena[id].get_mut().value = value;

        children.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (child, _) in children {
            id.append(child, arena);
        }

        if let Some(parent) = stack.last_mut() {
            parent.children.push((id, value));
        }
    }

    (root, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn sample_tree() -> TreeNode {
        TreeNode::dir(
            "/r",
            vec![
                TreeNode::leaf("/r/small", 1.0),
                TreeNode::dir(
                    "/r/dir",
                    vec![
                        TreeNode::leaf("/r/dir/x", 3.0),
                        TreeNode::leaf("/r/dir/y", 7.0),
                        TreeNode::dir(
                            "/r/dir/z",
                            vec![TreeNode::leaf("/r/dir/z/q", 2.0), TreeNode::leaf("/r/dir/z/w", 2.0)],
                        ),
                    ],
                ),
                TreeNode::leaf("/r/big", 20.0),
                TreeNode::dir("/r/empty", vec![]),
            ],
        )
    }

    #[test]
    fn test_two_leaf_scenario() {
        let tree = TreeNode::dir("root", vec![TreeNode::leaf("a", 5.0), TreeNode::leaf("b", 5.0)]);
        let layout = build_layout(&tree);
        let root = layout.root();

        assert_eq!(layout.node(root).value, 10.0);
        let a = layout.find_by_name("a").unwrap();
        let b = layout.find_by_name("b").unwrap();
        assert!((layout.node(a).span.x0 - 0.0).abs() < EPS);
        assert!((layout.node(a).span.x1 - PI).abs() < EPS);
        assert!((layout.node(b).span.x0 - PI).abs() < EPS);
        assert!((layout.node(b).span.x1 - TAU).abs() < EPS);
    }

    #[test]
    fn test_single_leaf_value() {
        let tree = TreeNode::dir("root", vec![TreeNode::leaf("only", 10.0)]);
        let layout = build_layout(&tree);
        assert_eq!(layout.node(layout.root()).value, 10.0);
    }

    #[test]
    fn test_value_conservation() {
        let layout = build_layout(&sample_tree());
        for id in layout.descendants() {
            let node = layout.node(id);
            if layout.children(id).next().is_some() {
                let sum: f64 = layout.children(id).map(|c| layout.node(c).value).sum();
                assert!((node.value - sum).abs() < EPS, "{} value {} != {}", node.name, node.value, sum);
            }
        }
        assert_eq!(layout.node(layout.root()).value, 35.0);
    }

    /// Children of every valued node cover its span without gaps or
    /// overlaps, in descending value order. Children of a zero-valued node
    /// all collapse onto its start.
    fn assert_tiles(layout: &LayoutTree) {
        for id in layout.descendants() {
            let parent = layout.node(id);
            let children: Vec<&LayoutNode> = layout.children(id).map(|c| layout.node(c)).collect();
            if children.is_empty() {
                continue;
            }
            if parent.value <= 0.0 {
                for child in &children {
                    assert!(child.span.is_degenerate(), "{} should be empty", child.name);
                    assert!((child.span.x0 - parent.span.x0).abs() < EPS);
                }
                continue;
            }
            assert!((children[0].span.x0 - parent.span.x0).abs() < EPS, "{} not covered at start", parent.name);
            assert!(
                (children[children.len() - 1].span.x1 - parent.span.x1).abs() < EPS,
                "{} not covered at end",
                parent.name
            );
            for pair in children.windows(2) {
                assert!((pair[0].span.x1 - pair[1].span.x0).abs() < EPS, "gap or overlap under {}", parent.name);
                assert!(pair[0].value >= pair[1].value, "not sorted descending under {}", parent.name);
            }
            for child in &children {
                assert!(child.span.x1 >= child.span.x0);
            }
        }
    }

    fn wide_tree() -> TreeNode {
        let leaves = (0..64)
            .map(|i| TreeNode::leaf(format!("/w/{i}"), ((i * 37) % 11 + 1) as f64 * 0.7))
            .collect();
        TreeNode::dir("/w", leaves)
    }

    fn deep_tree(levels: usize) -> TreeNode {
        let mut node = TreeNode::leaf("/deep/bottom", 1.5);
        for i in (0..levels).rev() {
            node = TreeNode::dir(
                format!("/deep/{i}"),
                vec![TreeNode::leaf(format!("/deep/{i}/side"), (i % 5) as f64 + 0.25), node],
            );
        }
        node
    }

    fn zero_valued_tree() -> TreeNode {
        TreeNode::dir(
            "/z",
            vec![
                TreeNode::dir("/z/empty", vec![TreeNode::leaf("/z/empty/a", 0.0), TreeNode::leaf("/z/empty/b", -1.0)]),
                TreeNode::leaf("/z/none", 0.0),
                TreeNode::dir("/z/full", vec![TreeNode::leaf("/z/full/c", 4.0)]),
            ],
        )
    }

    fn tied_tree() -> TreeNode {
        let group = |prefix: &str| -> Vec<TreeNode> {
            (0..7).map(|i| TreeNode::leaf(format!("{prefix}/{i}"), 2.0)).collect()
        };
        TreeNode::dir(
            "/t",
            vec![
                TreeNode::dir("/t/a", group("/t/a")),
                TreeNode::dir("/t/b", group("/t/b")),
                TreeNode::leaf("/t/c", 14.0),
            ],
        )
    }

    #[test]
    fn test_tiling_invariant() {
        let all_zero = TreeNode::dir("/0", vec![TreeNode::leaf("/0/a", 0.0), TreeNode::leaf("/0/b", 0.0)]);
        for tree in [sample_tree(), wide_tree(), deep_tree(40), zero_valued_tree(), tied_tree(), all_zero] {
            assert_tiles(&build_layout(&tree));
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let layout = build_layout(&tied_tree());
        let top: Vec<&str> = layout
            .children(layout.root())
            .map(|c| layout.node(c).name.as_str())
            .collect();
        assert_eq!(top, vec!["/t/a", "/t/b", "/t/c"]);

        let a = layout.find_by_name("/t/a").unwrap();
        let order: Vec<usize> = layout.children(a).map(|c| layout.node(c).source[1]).collect();
        assert_eq!(order, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_deep_tree_builds() {
        let levels = 1000;
        let layout = build_layout(&deep_tree(levels));

        assert_eq!(layout.height(), levels);
        assert_eq!(layout.len(), 2 * levels + 1);
        let bottom = layout.find_by_name("/deep/bottom").unwrap();
        assert_eq!(layout.node(bottom).depth, levels);
        assert_eq!(layout.node(bottom).source.len(), levels);
        let expected: f64 = 1.5 + (0..levels).map(|i| (i % 5) as f64 + 0.25).sum::<f64>();
        assert!((layout.node(layout.root()).value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_radial_bands_follow_depth() {
        let layout = build_layout(&sample_tree());
        assert_eq!(layout.height(), 3);
        for id in layout.descendants() {
            let node = layout.node(id);
            assert_eq!(node.span.y0, node.depth as f64);
            assert_eq!(node.span.y1, node.depth as f64 + 1.0);
            assert_eq!(node.current, node.span);
        }
    }

    #[test]
    fn test_interior_size_ignored_and_negative_clamped() {
        let mut dir = TreeNode::dir("d", vec![TreeNode::leaf("x", 4.0), TreeNode::leaf("neg", -6.0)]);
        dir.size = 1000.0;
        let layout = build_layout(&TreeNode::dir("root", vec![dir]));

        let d = layout.find_by_name("d").unwrap();
        let neg = layout.find_by_name("neg").unwrap();
        assert_eq!(layout.node(d).value, 4.0);
        assert_eq!(layout.node(neg).value, 0.0);
        assert!(layout.node(neg).span.width().abs() < EPS);
    }

    #[test]
    fn test_zero_value_root() {
        let tree = TreeNode::dir("root", vec![TreeNode::leaf("a", 0.0), TreeNode::leaf("b", 0.0)]);
        let layout = build_layout(&tree);
        for id in layout.children(layout.root()) {
            assert!(layout.node(id).span.is_degenerate());
        }
    }

    #[test]
    fn test_source_paths_and_ancestors() {
        let tree = sample_tree();
        let layout = build_layout(&tree);

        let q = layout.find_by_name("/r/dir/z/q").unwrap();
        assert_eq!(layout.node(q).source, vec![1, 2, 0]);
        assert_eq!(tree.get(&layout.node(q).source).unwrap().name, "/r/dir/z/q");

        let top = layout.top_level_ancestor(q).unwrap();
        assert_eq!(layout.node(top).name, "/r/dir");
        assert!(layout.top_level_ancestor(layout.root()).is_none());
    }

    #[test]
    fn test_renormalize_full_span_child() {
        let p = ArcSpan::new(1.2, 2.7, 2.0, 3.0);
        let c = ArcSpan::new(1.2, 2.7, 3.0, 4.0);
        let t = c.renormalized(&p, 2);
        assert_eq!(t.x0, 0.0);
        assert_eq!(t.x1, TAU);
        assert_eq!((t.y0, t.y1), (1.0, 2.0));

        // Outside the focus collapses to the edges
        let outside = ArcSpan::new(0.1, 0.5, 1.0, 2.0).renormalized(&p, 2);
        assert_eq!((outside.x0, outside.x1), (0.0, 0.0));
        assert_eq!((outside.y0, outside.y1), (0.0, 0.0));
    }
}
