//! Bidirectional path/waymark index
//!
//! Assigns every catalog node a compact numeric id derived from its position:
//! 1-based sibling index within the parent, composed as
//! `parent_id * 10 + index`, with the root at 0. Built once from the initial
//! tree and immutable afterwards; lazily merged sub-trees are deliberately
//! not re-indexed, which is what the prefix lookup exists for.
//!
//! The base-10 composition collides once a node has ten or more children
//! (the eleventh child of the root shares id 11 with the first grandchild).
//! That is a known limitation of the id scheme, kept as-is: the forward map
//! stays exact per path, and the reverse map keeps the last entry in
//! traversal order.

use crate::catalog::{Branch, Node};
use crate::types::{NodePath, Waymark, ROOT_WAYMARK};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Path ↔ waymark mapping with exact and prefix lookups.
pub struct WaymarkIndex {
    forward: HashMap<NodePath, Waymark>,
    reverse: HashMap<Waymark, NodePath>,
}

impl WaymarkIndex {
    /// Empty index. Lookups on an unbuilt index all miss.
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Builds the index for a tree.
    pub fn build(root: &Branch) -> Self {
        let mut index = Self::new();
        index.rebuild(root);
        index
    }

    /// Clears and repopulates both directions from `root`.
    ///
    /// Iterative pre-order walk with an explicit stack, so depth is bounded
    /// by the heap rather than the call stack. Every child gets an id;
    /// descent continues only into branches.
    pub fn rebuild(&mut self, root: &Branch) {
        self.forward.clear();
        self.reverse.clear();

        self.insert(NodePath::root(), ROOT_WAYMARK);

        let mut stack: Vec<(&Node, NodePath, Waymark)> = Vec::new();
        Self::push_children(&mut stack, root, &NodePath::root(), ROOT_WAYMARK);
        while let Some((node, path, id)) = stack.pop() {
            self.insert(path.clone(), id);
            if let Node::Branch(branch) = node {
                Self::push_children(&mut stack, branch, &path, id);
            }
        }
    }

    // Children are pushed in reverse so they pop in declaration order,
    // matching pre-order insertion.
    fn push_children<'a>(
        stack: &mut Vec<(&'a Node, NodePath, Waymark)>,
        branch: &'a Branch,
        path: &NodePath,
        parent_id: Waymark,
    ) {
        let Some(base) = parent_id.checked_mul(10) else {
            warn!(path = %path, parent_id, "waymark width exhausted, subtree not indexed");
            return;
        };
        for (position, (key, child)) in branch.children.iter().enumerate().rev() {
            let Some(id) = base.checked_add(position as u64 + 1) else {
                warn!(path = %path, key, "waymark width exhausted, child not indexed");
                continue;
            };
            stack.push((child, path.child(key), id));
        }
    }

    fn insert(&mut self, path: NodePath, id: Waymark) {
        if let Some(previous) = self.reverse.insert(id, path.clone()) {
            debug!(id, previous = %previous, replacement = %path, "waymark collision");
        }
        self.forward.insert(path, id);
    }

    /// Exact lookup: the waymark assigned to `path`, if indexed.
    pub fn id_for(&self, path: &NodePath) -> Option<Waymark> {
        self.forward.get(path.segments()).copied()
    }

    /// Longest-prefix lookup: the waymark of the longest indexed path that
    /// is a prefix of `path` (the path itself included). Probes prefix
    /// lengths in descending order; for a fixed query each length has at
    /// most one candidate, so the result is fully deterministic. Misses
    /// only when the index is empty.
    pub fn id_for_prefix_of(&self, path: &NodePath) -> Option<Waymark> {
        let segments = path.segments();
        (0..=segments.len())
            .rev()
            .find_map(|len| self.forward.get(&segments[..len]).copied())
    }

    /// Exact reverse lookup: the path a waymark was assigned to.
    pub fn path_for(&self, id: Waymark) -> Option<&NodePath> {
        self.reverse.get(&id)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// All (waymark, path) pairs, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (Waymark, &NodePath)> {
        self.reverse.iter().map(|(id, path)| (*id, path))
    }
}

impl Default for WaymarkIndex {
    fn default() -> Self {
        Self::new()
    }
}
