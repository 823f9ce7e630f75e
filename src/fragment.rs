//! URL location protocol
//!
//! The address bar carries at most a compact waymark: the fragment is either
//! empty or a decimal id (`#11`). Older shared links used an explicit
//! `path=<url-encoded JSON array>` query parameter; those are still read,
//! never written. Fragment writes go through the `FragmentSink` port and
//! always replace the current entry so URL sync never grows browser history.

use crate::types::{NodePath, Waymark};
use crate::index::WaymarkIndex;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Parsed `[?query][#fragment]` tail of a URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Location {
    /// Accepts full locations (`page?path=…#11`), bare fragments (`#11`),
    /// and bare queries (`?path=…`).
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let query = rest.split_once('?').map(|(_, query)| query.to_string());
        Self { query, fragment }
    }

    /// The waymark encoded in the fragment: all-digit fragments only.
    pub fn waymark(&self) -> Option<Waymark> {
        let fragment = self.fragment.as_deref()?;
        if fragment.is_empty() || !fragment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        fragment.parse().ok()
    }

    /// The explicit path carried by a legacy `path=` parameter.
    pub fn legacy_path(&self) -> Option<NodePath> {
        let query = self.query.as_deref()?;
        let encoded = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("path="))?;
        let decoded = urlencoding::decode(encoded).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    /// Resolves the location to a path. A numeric fragment is
    /// authoritative, even when it maps to nothing; the legacy parameter
    /// applies only when no numeric fragment is present.
    pub fn resolve(&self, index: &WaymarkIndex) -> Option<NodePath> {
        if let Some(id) = self.waymark() {
            return index.path_for(id).cloned();
        }
        self.legacy_path()
    }
}

/// Port for the address bar.
pub trait FragmentSink: Send + Sync {
    /// Replaces the fragment of the current history entry.
    fn replace(&self, fragment: &str);
    /// Pushes a new history entry with the fragment.
    fn push(&self, fragment: &str);
    /// Current fragment value, for surfaces that echo the address bar.
    fn current(&self) -> Option<String>;
}

/// In-memory sink: the terminal front end's address bar, and a write
/// recorder for tests.
#[derive(Default)]
pub struct MemoryFragmentSink {
    fragment: RwLock<Option<String>>,
    replaces: AtomicUsize,
    pushes: AtomicUsize,
}

impl MemoryFragmentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_count(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

impl FragmentSink for MemoryFragmentSink {
    fn replace(&self, fragment: &str) {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        *self.fragment.write() = Some(fragment.to_string());
    }

    fn push(&self, fragment: &str) {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        *self.fragment.write() = Some(fragment.to_string());
    }

    fn current(&self) -> Option<String> {
        self.fragment.read().clone()
    }
}
