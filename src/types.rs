//! Core types for the catalog navigation system.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Waymark: compact numeric identifier for a catalog path.
///
/// Composed digit-by-digit from 1-based sibling positions during the index
/// build, so the root is always `0` and `11` names the first child of the
/// first child.
pub type Waymark = u64;

/// Waymark of the catalog root (the empty path).
pub const ROOT_WAYMARK: Waymark = 0;

/// Ordered sequence of child keys from the catalog root to a node.
///
/// The empty path names the root. Paths are compared and hashed
/// structurally, and serialize as a JSON array of strings — the shape used
/// by both the persisted history payload and legacy `path=` links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Path extended by one child key.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// Path cut down to its first `depth` segments. Depth beyond the
    /// current length leaves the path unchanged.
    pub fn truncated(&self, depth: usize) -> Self {
        Self(self.0.iter().take(depth).cloned().collect())
    }

    /// Display title for history entries: root shows a fixed home label,
    /// deeper paths show the first one or two levels.
    pub fn title(&self) -> String {
        match self.0.as_slice() {
            [] => "Home".to_string(),
            [first] => first.clone(),
            [first, second, ..] => format!("{}/{}", first, second),
        }
    }
}

impl From<Vec<String>> for NodePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for NodePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

// Lets prefix probes against HashMap<NodePath, _> borrow a slice of the
// query instead of allocating a NodePath per probe.
impl Borrow<[String]> for NodePath {
    fn borrow(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.0.join("/"))
        }
    }
}
