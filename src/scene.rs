use std::collections::HashSet;

use indextree::NodeId;

use crate::color::Rgb;
use crate::radial_layout::ArcSpan;

/// Stable identity of a drawn arc across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArcKey {
    Node(NodeId),
    /// Aggregate of thin children, keyed by the parent's name
    Squashed(String),
}

impl ArcKey {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ArcKey::Node(id) => Some(*id),
            ArcKey::Squashed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    Leaf,
    Interior,
    Squashed,
}

/// One annular sector ready to be painted.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPrimitive {
    pub key: ArcKey,
    pub kind: ArcKind,
    pub span: ArcSpan,
    pub fill: Rgb,
    pub opacity: f32,
    /// Tooltip text
    pub label: String,
}

impl ArcPrimitive {
    pub fn is_clickable(&self) -> bool {
        self.kind == ArcKind::Interior
    }
}

/// Result of reconciling the previous keyed arc set with the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDiff {
    pub entered: Vec<ArcKey>,
    pub updated: Vec<ArcKey>,
    pub exited: Vec<ArcKey>,
}

impl SceneDiff {
    /// Classify keys by membership: in `next` only, in both, in `prev` only.
    /// Order follows `next` for entered/updated and `prev` for exited.
    pub fn between(prev: &[ArcKey], next: &[ArcKey]) -> Self {
        let before: HashSet<&ArcKey> = prev.iter().collect();
        let after: HashSet<&ArcKey> = next.iter().collect();

        let mut diff = SceneDiff::default();
        for key in next {
            if before.contains(key) {
                diff.updated.push(key.clone());
            } else {
                diff.entered.push(key.clone());
            }
        }
        diff.exited = prev.iter().filter(|k| !after.contains(k)).cloned().collect();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }

    /// Nodes drawn after the change, entered or kept.
    pub fn drawn_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entered.iter().chain(&self.updated).filter_map(ArcKey::node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indextree::Arena;

    #[test]
    fn test_diff_by_key() {
        let mut arena = Arena::new();
        let a = arena.new_node(());
        let b = arena.new_node(());
        let c = arena.new_node(());

        let prev = vec![ArcKey::Node(a), ArcKey::Node(b), ArcKey::Squashed("p".into())];
        let next = vec![ArcKey::Node(b), ArcKey::Node(c), ArcKey::Squashed("q".into())];
        let diff = SceneDiff::between(&prev, &next);

        assert_eq!(diff.entered, vec![ArcKey::Node(c), ArcKey::Squashed("q".into())]);
        assert_eq!(diff.updated, vec![ArcKey::Node(b)]);
        assert_eq!(diff.exited, vec![ArcKey::Node(a), ArcKey::Squashed("p".into())]);
        assert!(!diff.is_empty());
        assert_eq!(diff.drawn_nodes().collect::<Vec<_>>(), vec![c, b]);
    }

    #[test]
    fn test_identical_sets_only_update() {
        let mut arena = Arena::new();
        let keys: Vec<ArcKey> = (0..3).map(|i| ArcKey::Node(arena.new_node(i))).collect();
        let diff = SceneDiff::between(&keys, &keys);
        assert!(diff.is_empty());
        assert_eq!(diff.updated, keys);
    }
}
