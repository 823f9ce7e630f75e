//! Catalog tree model and content JSON format
//!
//! A catalog is a tree of branches (navigable categories) and leaves
//! (terminal link sets). The content JSON format uses in-band conventions:
//! the `"index"` key holds a branch's description-document reference, the
//! `"dataFile"` key holds a lazily-fetched sub-tree reference, and an object
//! containing `"flag": "1"` is a leaf whose remaining string entries are
//! links. Deserialization lifts those conventions into typed fields and
//! preserves document order of children, which waymark assignment depends on.

use crate::types::NodePath;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Key carrying a branch's description-document reference.
const INDEX_KEY: &str = "index";
/// Key carrying a branch's sub-tree data reference.
const DATA_FILE_KEY: &str = "dataFile";
/// Marker entry that turns an object into a leaf.
const LEAF_FLAG_KEY: &str = "flag";
const LEAF_FLAG_VALUE: &str = "1";

/// Terminal node: an ordered set of labeled links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaf {
    pub links: Vec<(String, String)>, // (label, url) in declaration order
}

/// Navigable node: ordered children plus optional metadata references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    /// Markdown document describing this branch, fetched on render.
    pub index_doc: Option<String>,
    /// Sub-tree reference resolved lazily on first navigation; cleared by
    /// the merge so resolution happens once per node.
    pub data_file: Option<String>,
    pub children: Vec<(String, Node)>, // (key, node) in declaration order
}

/// Catalog node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(Branch),
    Leaf(Leaf),
}

impl Branch {
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }

    /// Merges a fetched sub-tree into this branch.
    ///
    /// Children with matching keys are replaced in place (keeping their
    /// original position), new keys are appended in fragment order, and the
    /// fragment's metadata wins where present. The branch's `data_file` is
    /// cleared so a second navigation does not re-resolve.
    pub fn merge_fragment(&mut self, fragment: Branch) {
        for (key, node) in fragment.children {
            match self.child_mut(&key) {
                Some(existing) => *existing = node,
                None => self.children.push((key, node)),
            }
        }
        if fragment.index_doc.is_some() {
            self.index_doc = fragment.index_doc;
        }
        self.data_file = None;
    }

    /// Collects every sub-tree reference reachable from this branch,
    /// depth-first, its own included.
    pub fn collect_data_files(&self, out: &mut Vec<String>) {
        if let Some(reference) = &self.data_file {
            out.push(reference.clone());
        }
        for (_, child) in &self.children {
            if let Node::Branch(branch) = child {
                branch.collect_data_files(out);
            }
        }
    }
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }
}

/// In-memory catalog tree, rooted at a branch.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: Node,
}

impl Catalog {
    /// Parses the content JSON format. The top-level object must be a
    /// branch; a leaf root has nothing to navigate.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let root: Node = serde_json::from_str(raw)?;
        if root.is_leaf() {
            return Err(de::Error::custom("catalog root cannot be a leaf"));
        }
        Ok(Self { root })
    }

    /// Catalog rooted at an already-parsed branch.
    pub fn from_branch(root: Branch) -> Self {
        Self {
            root: Node::Branch(root),
        }
    }

    /// Empty catalog (root with no children).
    pub fn empty() -> Self {
        Self {
            root: Node::Branch(Branch::default()),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_branch(&self) -> &Branch {
        match &self.root {
            Node::Branch(branch) => branch,
            // from_json_str and empty() both guarantee a branch root
            Node::Leaf(_) => unreachable!("catalog root is always a branch"),
        }
    }

    /// Walks the tree to the node at `path`. Returns None if any segment is
    /// absent or the walk hits a leaf before the path ends.
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.as_branch()?.child(segment)?;
        }
        Some(current)
    }

    /// Mutable walk to the branch at `path`. None if the path is absent or
    /// names a leaf.
    pub fn branch_at_mut(&mut self, path: &NodePath) -> Option<&mut Branch> {
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = match current {
                Node::Branch(branch) => branch.child_mut(segment)?,
                Node::Leaf(_) => return None,
            };
        }
        match current {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

// The content format cannot be derived: children must stay in document
// order and the metadata/leaf conventions are value-dependent, so both
// directions are written against the serde map machinery directly.

enum RawEntry {
    Text(String),
    Node(Node),
}

struct RawEntryVisitor;

impl<'de> Visitor<'de> for RawEntryVisitor {
    type Value = RawEntry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a nested catalog object")
    }

    fn visit_str<E>(self, value: &str) -> Result<RawEntry, E>
    where
        E: de::Error,
    {
        Ok(RawEntry::Text(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<RawEntry, E>
    where
        E: de::Error,
    {
        Ok(RawEntry::Text(value))
    }

    fn visit_map<A>(self, map: A) -> Result<RawEntry, A::Error>
    where
        A: MapAccess<'de>,
    {
        NodeVisitor.visit_map(map).map(RawEntry::Node)
    }
}

impl<'de> Deserialize<'de> for RawEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawEntryVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a catalog node object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut index_doc: Option<String> = None;
        let mut data_file: Option<String> = None;
        let mut is_leaf = false;
        let mut texts: Vec<(String, String)> = Vec::new();
        let mut children: Vec<(String, Node)> = Vec::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                INDEX_KEY => index_doc = Some(map.next_value()?),
                DATA_FILE_KEY => data_file = Some(map.next_value()?),
                _ => match map.next_value::<RawEntry>()? {
                    RawEntry::Text(value) => {
                        if key == LEAF_FLAG_KEY && value == LEAF_FLAG_VALUE {
                            is_leaf = true;
                        } else {
                            texts.push((key, value));
                        }
                    }
                    RawEntry::Node(node) => children.push((key, node)),
                },
            }
        }

        if is_leaf {
            // nested objects inside a leaf have no slot in the model
            Ok(Node::Leaf(Leaf { links: texts }))
        } else {
            // likewise plain-string entries under a branch
            Ok(Node::Branch(Branch {
                index_doc,
                data_file,
                children,
            }))
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(NodeVisitor)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Leaf(leaf) => {
                let mut map = serializer.serialize_map(Some(leaf.links.len() + 1))?;
                map.serialize_entry(LEAF_FLAG_KEY, LEAF_FLAG_VALUE)?;
                for (label, url) in &leaf.links {
                    map.serialize_entry(label, url)?;
                }
                map.end()
            }
            Node::Branch(branch) => {
                let extras = branch.index_doc.is_some() as usize
                    + branch.data_file.is_some() as usize;
                let mut map =
                    serializer.serialize_map(Some(branch.children.len() + extras))?;
                if let Some(doc) = &branch.index_doc {
                    map.serialize_entry(INDEX_KEY, doc)?;
                }
                if let Some(reference) = &branch.data_file {
                    map.serialize_entry(DATA_FILE_KEY, reference)?;
                }
                for (key, child) in &branch.children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}
