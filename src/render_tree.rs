use std::collections::HashMap;

use indextree::NodeId;

use crate::radial_layout::{ArcSpan, LayoutNode, LayoutTree};

/// Merged aggregates narrower than the threshold by less than this still count.
const SQUASH_EPSILON: f64 = 1e-9;

/// Which snapshot of the layout drives a render-set decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// What is on screen now (first render)
    Current,
    /// Where a transition is heading
    Target,
}

impl Geometry {
    pub fn of(self, node: &LayoutNode) -> ArcSpan {
        match self {
            Geometry::Current => node.current,
            Geometry::Target => node.target,
        }
    }
}

/// Thin siblings merged into one representative arc.
#[derive(Debug, Clone, PartialEq)]
pub struct SquashedArc {
    pub parent_name: String,
    pub span: ArcSpan,
    /// Number of arcs merged into this one
    pub count: usize,
}

/// Arcs to draw for one focus state.
#[derive(Debug, Clone, Default)]
pub struct RenderSet {
    pub main_arcs: Vec<NodeId>,
    /// Keyed by parent name, in first-merge order
    pub squashed_arcs: Vec<SquashedArc>,
}

impl RenderSet {
    pub fn squashed(&self, parent_name: &str) -> Option<&SquashedArc> {
        self.squashed_arcs.iter().find(|s| s.parent_name == parent_name)
    }
}

/// Whether `node` gets a ring at this focus depth.
///
/// The focus itself and everything above it are represented by the center
/// disk; only `visible_depth` rings are drawn below it.
pub fn compute_visibility(node: &LayoutNode, focus_depth: usize, visible_depth: usize, span: &ArcSpan) -> bool {
    node.depth > focus_depth && node.depth <= focus_depth + visible_depth && !span.is_degenerate()
}

/// Split the visible nodes into individually drawn arcs and squashed
/// aggregates.
///
/// Two-tier policy:
///   - arcs at least `angle_threshold` wide are drawn on their own,
///   - thinner visible arcs are merged per parent into one aggregate span,
///     which is kept only if the merged width reaches the threshold.
pub fn select_render_set(
    layout: &LayoutTree,
    focus_depth: usize,
    geometry: Geometry,
    visible_depth: usize,
    angle_threshold: f64,
) -> RenderSet {
    let mut main_arcs = Vec::new();
    let mut squashed: Vec<SquashedArc> = Vec::new();
    let mut squash_index: HashMap<String, usize> = HashMap::new();

    for id in layout.descendants() {
        let node = layout.node(id);
        let span = geometry.of(node);
        if !compute_visibility(node, focus_depth, visible_depth, &span) {
            continue;
        }

        if span.width() >= angle_threshold {
            main_arcs.push(id);
            continue;
        }

        // Visible nodes are below the focus, so they always have a parent
        let Some(parent) = layout.parent(id) else {
            continue;
        };
        let parent_name = &layout.node(parent).name;
        match squash_index.get(parent_name) {
            Some(&slot) => {
                let arc = &mut squashed[slot];
                arc.span.merge_angle(&span);
                arc.count += 1;
            }
            None => {
                squash_index.insert(parent_name.clone(), squashed.len());
                squashed.push(SquashedArc {
                    parent_name: parent_name.clone(),
                    span,
                    count: 1,
                });
            }
        }
    }

    let merged = squashed.len();
    squashed.retain(|arc| arc.span.width() + SQUASH_EPSILON >= angle_threshold);

    tracing::debug!(
        focus_depth,
        main = main_arcs.len(),
        squashed = squashed.len(),
        dropped = merged - squashed.len(),
        "selected render set"
    );

    RenderSet {
        main_arcs,
        squashed_arcs: squashed,
    }
}
