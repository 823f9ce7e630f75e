//! Render-ready snapshots of the current catalog position

use crate::catalog::Node;
use crate::types::{NodePath, Waymark};
use serde::Serialize;

/// What a branch description resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Description {
    /// The branch has no description document.
    Absent,
    /// Raw Markdown; rendering it is the front end's concern.
    Markdown(String),
    /// The document fetch failed; front ends show fallback text.
    Unavailable,
}

/// Entry kind in a branch listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Branch child: selecting it descends.
    Folder,
    /// Leaf child: selecting it opens a link set.
    Resource,
}

/// A selectable entry in a branch listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    pub key: String,
    pub kind: EntryKind,
}

/// One link of a leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkView {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewContent {
    /// A branch: its children as selectable entries.
    Listing {
        entries: Vec<EntryView>,
        description: Description,
    },
    /// A leaf: its links.
    Links { links: Vec<LinkView> },
    /// Nothing at the path.
    Empty,
}

/// Snapshot handed to the renderer after each navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub path: NodePath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waymark: Option<Waymark>,
    pub content: ViewContent,
}

impl CatalogView {
    /// Degraded view for a path with nothing behind it.
    pub fn empty(path: NodePath) -> Self {
        Self {
            path,
            waymark: None,
            content: ViewContent::Empty,
        }
    }

    pub fn from_node(
        path: NodePath,
        waymark: Option<Waymark>,
        node: &Node,
        description: Description,
    ) -> Self {
        let content = match node {
            Node::Leaf(leaf) => ViewContent::Links {
                links: leaf
                    .links
                    .iter()
                    .map(|(label, url)| LinkView {
                        label: label.clone(),
                        url: url.clone(),
                    })
                    .collect(),
            },
            Node::Branch(branch) => ViewContent::Listing {
                entries: branch
                    .children
                    .iter()
                    .map(|(key, child)| EntryView {
                        key: key.clone(),
                        kind: if child.is_leaf() {
                            EntryKind::Resource
                        } else {
                            EntryKind::Folder
                        },
                    })
                    .collect(),
                description,
            },
        };
        Self {
            path,
            waymark,
            content,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, ViewContent::Empty)
    }

    /// Listing entries, empty for leaves and degraded views.
    pub fn entries(&self) -> &[EntryView] {
        match &self.content {
            ViewContent::Listing { entries, .. } => entries,
            _ => &[],
        }
    }

    /// Leaf links, empty elsewhere.
    pub fn links(&self) -> &[LinkView] {
        match &self.content {
            ViewContent::Links { links } => links,
            _ => &[],
        }
    }
}
