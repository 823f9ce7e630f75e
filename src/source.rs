//! Content source port and implementations
//!
//! Catalog content lives in static assets: sub-tree fragments as JSON data
//! files and branch descriptions as Markdown documents. Sources address both
//! by the relative reference strings that appear in the content itself
//! (data references carry their own `data/` style prefix, document
//! references are bare names resolved under the source's doc base).

use crate::catalog::{Branch, Node};
use crate::error::FetchError;
use async_trait::async_trait;
use serde::de::Error as _;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Port for fetching catalog content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches and parses the sub-tree fragment at `reference`.
    async fn fetch_subtree(&self, reference: &str) -> Result<Branch, FetchError>;

    /// Fetches the raw Markdown document at `reference`.
    async fn fetch_document(&self, reference: &str) -> Result<String, FetchError>;
}

/// Parses a fetched fragment. Fragments merge into branches, so a leaf at
/// the fragment root is malformed content.
fn parse_fragment(reference: &str, raw: &str) -> Result<Branch, FetchError> {
    let node: Node =
        serde_json::from_str(raw).map_err(|source| FetchError::MalformedContent {
            reference: reference.to_string(),
            source,
        })?;
    match node {
        Node::Branch(branch) => Ok(branch),
        Node::Leaf(_) => Err(FetchError::MalformedContent {
            reference: reference.to_string(),
            source: serde_json::Error::custom("fragment root cannot be a leaf"),
        }),
    }
}

/// Content source reading from a static asset directory.
pub struct DirContentSource {
    root: PathBuf,
    doc_base: String,
}

impl DirContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            doc_base: "docs".to_string(),
        }
    }

    pub fn with_doc_base(mut self, doc_base: impl Into<String>) -> Self {
        self.doc_base = doc_base.into();
        self
    }

    fn read(&self, path: PathBuf, reference: &str) -> Result<String, FetchError> {
        if !path.exists() {
            return Err(FetchError::NotFound(reference.to_string()));
        }
        std::fs::read_to_string(&path).map_err(|source| FetchError::IoError {
            reference: reference.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ContentSource for DirContentSource {
    async fn fetch_subtree(&self, reference: &str) -> Result<Branch, FetchError> {
        debug!(reference, "reading subtree fragment");
        let raw = self.read(self.root.join(reference), reference)?;
        parse_fragment(reference, &raw)
    }

    async fn fetch_document(&self, reference: &str) -> Result<String, FetchError> {
        debug!(reference, "reading document");
        self.read(self.root.join(&self.doc_base).join(reference), reference)
    }
}

/// Content source fetching assets over HTTP.
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: String,
    doc_base: String,
}

impl HttpContentSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            doc_base: "docs".to_string(),
        }
    }

    pub fn with_doc_base(mut self, doc_base: impl Into<String>) -> Self {
        self.doc_base = doc_base.into();
        self
    }

    async fn get(&self, location: &str, reference: &str) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), location);
        debug!(%url, "fetching content");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(reference.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::StatusError {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_subtree(&self, reference: &str) -> Result<Branch, FetchError> {
        let raw = self.get(reference, reference).await?;
        parse_fragment(reference, &raw)
    }

    async fn fetch_document(&self, reference: &str) -> Result<String, FetchError> {
        let location = format!("{}/{}", self.doc_base, reference);
        self.get(&location, reference).await
    }
}

/// In-memory content source for embedded catalogs and tests. Counts fetches
/// and can be told to fail specific references.
#[derive(Default)]
pub struct StaticContentSource {
    subtrees: HashMap<String, String>,
    documents: HashMap<String, String>,
    failing: parking_lot::RwLock<HashSet<String>>,
    fetches: AtomicUsize,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subtree(mut self, reference: impl Into<String>, json: impl Into<String>) -> Self {
        self.subtrees.insert(reference.into(), json.into());
        self
    }

    pub fn with_document(mut self, reference: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(reference.into(), text.into());
        self
    }

    /// Starts failing a reference with a server error.
    pub fn fail(&self, reference: impl Into<String>) {
        self.failing.write().insert(reference.into());
    }

    /// Stops failing a reference.
    pub fn recover(&self, reference: &str) {
        self.failing.write().remove(reference);
    }

    /// Total fetches issued against this source, both kinds.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_failing(&self, reference: &str) -> Result<(), FetchError> {
        if self.failing.read().contains(reference) {
            return Err(FetchError::StatusError {
                reference: reference.to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn fetch_subtree(&self, reference: &str) -> Result<Branch, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing(reference)?;
        match self.subtrees.get(reference) {
            Some(raw) => parse_fragment(reference, raw),
            None => Err(FetchError::NotFound(reference.to_string())),
        }
    }

    async fn fetch_document(&self, reference: &str) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing(reference)?;
        self.documents
            .get(reference)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(reference.to_string()))
    }
}
