use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SunburstError};

/// Input node of the chart dataset.
///
/// `size` only matters on leaves; interior sizes are always re-derived from
/// the subtree when the layout is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    #[serde(default)]
    pub size: f64,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>, size: f64) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            size,
        }
    }

    pub fn dir(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            children,
            size: 0.0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Leaf size clamped to a usable weight (negative or NaN counts as 0).
    pub fn weight(&self) -> f64 {
        if self.size.is_finite() && self.size > 0.0 {
            self.size
        } else {
            0.0
        }
    }

    /// Parse a tree from JSON. Nesting depth is not limited.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let tree = TreeNode::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(tree)
    }

    /// Follow an index path from this node (empty path = self).
    pub fn get(&self, index_path: &[usize]) -> Option<&TreeNode> {
        let mut node = self;
        for &i in index_path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Detach the node at `index_path` and return it. The root itself
    /// (empty path) cannot be removed.
    pub fn remove_at(&mut self, index_path: &[usize]) -> Option<TreeNode> {
        let (&last, parent_path) = index_path.split_last()?;
        let mut parent = self;
        for &i in parent_path {
            parent = parent.children.get_mut(i)?;
        }
        if last < parent.children.len() {
            Some(parent.children.remove(last))
        } else {
            None
        }
    }

    /// Number of nodes in the subtree, self included.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

/// Load a tree dataset from a JSON file.
pub fn load_tree<P: AsRef<Path>>(path: P) -> Result<TreeNode> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SunburstError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = TreeNode::from_json_str(&text)?;
    tracing::debug!(path = %path.display(), nodes = tree.count(), "loaded tree");
    Ok(tree)
}
