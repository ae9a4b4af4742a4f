use std::collections::{HashMap, HashSet};
use std::time::Duration;

use glam::DVec2;
use indextree::NodeId;

use crate::animation::{Easing, Fade, SpanTween, Transition};
use crate::canvas::ArcGeometry;
use crate::color::{Palette, Rgb};
use crate::config::ChartConfig;
use crate::error::Result;
use crate::radial_layout::{ArcSpan, LayoutTree};
use crate::render_tree::{select_render_set, Geometry, RenderSet, SquashedArc};
use crate::scene::{ArcKey, ArcKind, ArcPrimitive, SceneDiff};
use crate::tree::TreeNode;

/// What a pointer click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Arc(NodeId),
    /// The disk in the middle, standing for the focus; clicking it zooms out
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
}

/// A node described for host actions (open, copy, trash).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTarget {
    pub node: NodeId,
    pub path: String,
    /// Directory to open in the file manager: the node itself for
    /// directories, its parent for files
    pub open_path: String,
    pub is_dir: bool,
    /// Index path of the node in the input tree
    pub source: Vec<usize>,
}

/// Sunburst renderer: owns the layout, the focus and all animation state.
pub struct RadialTreeRenderer {
    layout: LayoutTree,
    focus: NodeId,
    config: ChartConfig,
    geometry: ArcGeometry,
    squash_fill: Rgb,
    fills: HashMap<NodeId, Rgb>,
    render_set: RenderSet,
    transition: Option<Transition>,
    /// Fade of the main arcs; only the first render has one
    main_fade: Option<Fade>,
    squash_fade: Fade,
    keys: Vec<ArcKey>,
    last_diff: SceneDiff,
}

impl RadialTreeRenderer {
    pub fn new(tree: &TreeNode, config: ChartConfig) -> Result<Self> {
        config.validate()?;
        let mut palette = config.palette()?;
        let layout = LayoutTree::build(tree);
        let fills = assign_fills(&layout, &mut palette);
        let focus = layout.root();

        let mut renderer = Self {
            geometry: ArcGeometry::from_config(&config),
            squash_fill: palette.squashed,
            layout,
            focus,
            config,
            fills,
            render_set: RenderSet::default(),
            transition: None,
            main_fade: None,
            squash_fade: Fade::hidden(),
            keys: Vec::new(),
            last_diff: SceneDiff::default(),
        };

        let set = renderer.select(0, Geometry::Current);
        renderer.render(set, true);
        Ok(renderer)
    }

    fn select(&self, focus_depth: usize, geometry: Geometry) -> RenderSet {
        select_render_set(
            &self.layout,
            focus_depth,
            geometry,
            self.config.visible_depth,
            self.config.angle_threshold(),
        )
    }

    /// Install a new render set and reconcile its keys with the previous one.
    fn render(&mut self, set: RenderSet, is_initial: bool) {
        let keys: Vec<ArcKey> = set
            .main_arcs
            .iter()
            .map(|&id| ArcKey::Node(id))
            .chain(set.squashed_arcs.iter().map(|s| ArcKey::Squashed(s.parent_name.clone())))
            .collect();
        self.last_diff = SceneDiff::between(&self.keys, &keys);
        self.keys = keys;
        self.render_set = set;

        if is_initial {
            let fade = Fade::fade_in(self.config.transition_duration());
            self.main_fade = Some(fade);
            self.squash_fade = fade;
        } else {
            // The zoom tween carries the change; squashed arcs wait for it
            self.main_fade = None;
            self.squash_fade = Fade::hidden();
        }
    }

    /// Handle a click. Returns whether a transition was started.
    pub fn click(&mut self, target: ClickTarget) -> bool {
        let p = match target {
            ClickTarget::Arc(id) => {
                let node = self.layout.node(id);
                if !node.has_children || node.span.is_degenerate() {
                    return false;
                }
                id
            }
            ClickTarget::Center => match self.layout.parent(self.focus) {
                Some(parent) => parent,
                None if self.config.replay_root_zoom_out => self.layout.root(),
                None => {
                    tracing::debug!("center clicked at root, nothing to zoom out to");
                    return false;
                }
            },
        };
        self.zoom_to(p);
        true
    }

    fn zoom_to(&mut self, p: NodeId) {
        self.focus = p;
        let (focus_span, focus_depth) = {
            let node = self.layout.node(p);
            (node.span, node.depth)
        };

        let ids: Vec<NodeId> = self.layout.descendants().collect();
        for &id in &ids {
            let node = self.layout.node_mut(id);
            node.target = node.span.renormalized(&focus_span, focus_depth);
        }

        let set = self.select(focus_depth, Geometry::Target);
        self.render(set, false);

        // Arcs entering or staying in the scene tween from their live spans,
        // so an interrupted transition continues from wherever it was. The
        // rest jump straight to their target.
        let animated: HashSet<NodeId> = self.last_diff.drawn_nodes().collect();
        let mut tweens = Vec::with_capacity(animated.len());
        for &id in &ids {
            let node = self.layout.node_mut(id);
            if animated.contains(&id) {
                tweens.push(SpanTween {
                    node: id,
                    from: node.current,
                    to: node.target,
                });
            } else {
                node.current = node.target;
            }
        }

        tracing::info!(
            focus = %self.layout.node(p).name,
            depth = focus_depth,
            arcs = tweens.len(),
            "zoom transition"
        );

        self.transition = Some(Transition::start(
            tweens,
            self.config.transition_duration(),
            Easing::CubicInOut,
        ));
    }

    /// Advance all animations by one frame. Returns whether anything is
    /// still animating.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if let Some(fade) = self.main_fade.as_mut() {
            fade.advance(dt);
        }
        self.squash_fade.advance(dt);

        if let Some(transition) = self.transition.as_mut() {
            transition.advance(dt);
            for (id, span) in transition.frame() {
                self.layout.node_mut(id).current = span;
            }
            if transition.is_finished() {
                self.transition = None;
                self.squash_fade = Fade::fade_in(self.config.squash_fade_duration());
            }
        }

        self.is_animating()
    }

    /// Jump every animation to its end state.
    pub fn finish_immediately(&mut self) {
        if let Some(mut transition) = self.transition.take() {
            transition.finish();
            for (id, span) in transition.frame() {
                self.layout.node_mut(id).current = span;
            }
            self.squash_fade = Fade::fade_in(Duration::ZERO);
        }
        if let Some(fade) = self.main_fade.as_mut() {
            fade.finish();
        }
        self.squash_fade.finish();
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
            || !self.squash_fade.is_finished()
            || self.main_fade.is_some_and(|f| !f.is_finished())
    }

    pub fn phase(&self) -> Phase {
        if self.transition.is_some() {
            Phase::Transitioning
        } else {
            Phase::Idle
        }
    }

    /// Arc primitives for the current frame, main arcs first.
    pub fn arcs(&self) -> Vec<ArcPrimitive> {
        let main_opacity = self.main_fade.map_or(1.0, |f| f.opacity());
        let squash_opacity = self.squash_fade.opacity();

        let main = self.render_set.main_arcs.iter().map(|&id| {
            let node = self.layout.node(id);
            ArcPrimitive {
                key: ArcKey::Node(id),
                kind: if node.has_children { ArcKind::Interior } else { ArcKind::Leaf },
                span: node.current,
                fill: self.fills.get(&id).copied().unwrap_or(self.squash_fill),
                opacity: main_opacity,
                label: node.name.clone(),
            }
        });
        let squashed = self.render_set.squashed_arcs.iter().map(|s| ArcPrimitive {
            key: ArcKey::Squashed(s.parent_name.clone()),
            kind: ArcKind::Squashed,
            span: s.span,
            fill: self.squash_fill,
            opacity: squash_opacity,
            label: self.config.squash_label.clone(),
        });
        main.chain(squashed).collect()
    }

    /// Main arc under `point` (logical coordinates), leaves included.
    pub fn arc_at(&self, point: DVec2) -> Option<NodeId> {
        self.render_set
            .main_arcs
            .iter()
            .copied()
            .find(|&id| self.geometry.contains(&self.layout.node(id).current, point))
    }

    /// Squashed aggregate under `point`, unless squashed arcs are hidden.
    pub fn squashed_at(&self, point: DVec2) -> Option<&SquashedArc> {
        if self.squash_fade.opacity() <= 0.0 {
            return None;
        }
        self.render_set
            .squashed_arcs
            .iter()
            .find(|s| self.geometry.contains(&s.span, point))
    }

    /// Resolve a click position to the center disk or a zoomable arc.
    pub fn hit_test(&self, point: DVec2) -> Option<ClickTarget> {
        if self.geometry.in_center(point) {
            return Some(ClickTarget::Center);
        }
        self.arc_at(point)
            .filter(|&id| self.layout.node(id).has_children)
            .map(ClickTarget::Arc)
    }

    /// Tooltip text for whatever is under `point`.
    pub fn label_at(&self, point: DVec2) -> Option<&str> {
        if let Some(id) = self.arc_at(point) {
            return Some(self.layout.node(id).name.as_str());
        }
        self.squashed_at(point).map(|_| self.config.squash_label.as_str())
    }

    pub fn action_target(&self, id: NodeId) -> ActionTarget {
        let node = self.layout.node(id);
        let open_path = if node.has_children {
            node.name.clone()
        } else {
            self.layout
                .parent(id)
                .map(|parent| self.layout.node(parent).name.clone())
                .unwrap_or_else(|| node.name.clone())
        };
        ActionTarget {
            node: id,
            path: node.name.clone(),
            open_path,
            is_dir: node.has_children,
            source: node.source.clone(),
        }
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn render_set(&self) -> &RenderSet {
        &self.render_set
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn last_diff(&self) -> &SceneDiff {
        &self.last_diff
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn geometry(&self) -> &ArcGeometry {
        &self.geometry
    }

    /// Spans currently on screen for every node, keyed by id.
    pub fn current_spans(&self) -> HashMap<NodeId, ArcSpan> {
        self.layout
            .descendants()
            .map(|id| (id, self.layout.node(id).current))
            .collect()
    }
}

/// Fill per node. Branch hues are handed out in layout order, so the
/// largest top-level directory always gets the first color.
fn assign_fills(layout: &LayoutTree, palette: &mut Palette) -> HashMap<NodeId, Rgb> {
    let mut fills = HashMap::with_capacity(layout.len());
    for id in layout.descendants() {
        let node = layout.node(id);
        let fill = if !node.has_children {
            palette.leaf
        } else {
            match layout.top_level_ancestor(id) {
                Some(top) => palette.interior_color(&layout.node(top).name, node.depth),
                // The root is never drawn as an arc
                None => palette.leaf,
            }
        };
        fills.insert(id, fill);
    }
    fills
}
