//! Navigation: current path, rendering, history, URL sync
//!
//! Every user action funnels through `navigate_to`: it resolves the node
//! (fetching and merging a pending sub-tree if the branch carries one),
//! renders the view, appends history, and rewrites the URL fragment, in that
//! order. Resolution can suspend, and the user may navigate again in the
//! meantime; completions therefore carry the navigation epoch they started
//! with and apply no side effects once superseded.
//!
//! Lookup misses never escalate: an absent path renders the empty view, a
//! failed fetch renders the unmerged node, and the fragment degrades to the
//! longest indexed prefix.

use crate::catalog::{Catalog, Node};
use crate::fragment::{FragmentSink, Location};
use crate::history::{HistoryLog, HistoryRecord};
use crate::loader::SubtreeLoader;
use crate::render::Renderer;
use crate::source::ContentSource;
use crate::types::NodePath;
use crate::view::{CatalogView, Description};
use crate::index::WaymarkIndex;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Navigator {
    catalog: Arc<RwLock<Catalog>>,
    index: Arc<WaymarkIndex>,
    loader: Arc<SubtreeLoader>,
    source: Arc<dyn ContentSource>,
    history: Mutex<HistoryLog>,
    renderer: Arc<dyn Renderer>,
    sink: Arc<dyn FragmentSink>,
    current: RwLock<NodePath>,
    epoch: AtomicU64,
}

impl Navigator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<RwLock<Catalog>>,
        index: Arc<WaymarkIndex>,
        loader: Arc<SubtreeLoader>,
        source: Arc<dyn ContentSource>,
        history: HistoryLog,
        renderer: Arc<dyn Renderer>,
        sink: Arc<dyn FragmentSink>,
    ) -> Self {
        Self {
            catalog,
            index,
            loader,
            source,
            history: Mutex::new(history),
            renderer,
            sink,
            current: RwLock::new(NodePath::root()),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn current_path(&self) -> NodePath {
        self.current.read().clone()
    }

    /// Navigates to a path: resolves its content, renders it, records it in
    /// history, and synchronizes the URL fragment.
    ///
    /// An absent path renders the empty view and records nothing; the
    /// fragment is still synchronized best-effort. If another navigation
    /// starts while this one is resolving, the superseded completion
    /// returns its view without rendering, recording, or touching the URL.
    pub async fn navigate_to(&self, path: NodePath) -> CatalogView {
        let epoch = self.begin(&path);
        let view = self.resolve_view(&path).await;
        if !self.is_current(epoch) {
            debug!(path = %path, "navigation superseded, discarding completion");
            return view;
        }

        self.renderer.render(&view);
        if !view.is_empty() {
            let url_id = self
                .index
                .id_for(&path)
                .or_else(|| self.index.id_for_prefix_of(&path));
            self.history.lock().record(path.clone(), path.title(), url_id);
        }
        self.sync_url();
        view
    }

    /// Navigates to the current path cut down to `depth` segments.
    pub async fn navigate_up(&self, depth: usize) -> CatalogView {
        let target = self.current.read().truncated(depth);
        self.navigate_to(target).await
    }

    /// Rewrites the URL fragment from the current path: the exact waymark
    /// when indexed, `0` for the root, otherwise the longest indexed prefix,
    /// otherwise an empty fragment. Always a replace, never a push, so
    /// repeated syncs cannot grow browser history.
    pub fn sync_url(&self) {
        let path = self.current.read().clone();
        match self.index.id_for(&path) {
            Some(id) => self.sink.replace(&id.to_string()),
            None if path.is_root() => self.sink.replace("0"),
            None => match self.index.id_for_prefix_of(&path) {
                Some(id) => {
                    debug!(path = %path, id, "fragment set from longest indexed prefix");
                    self.sink.replace(&id.to_string());
                }
                None => self.sink.replace(""),
            },
        }
    }

    /// Entry point for address-bar changes and deep links. A location that
    /// resolves to a path is navigated to in full; anything else keeps the
    /// current path and re-renders it.
    pub async fn on_url_changed(&self, location: &Location) -> CatalogView {
        match location.resolve(&self.index) {
            Some(path) => {
                info!(path = %path, "location resolved");
                self.navigate_to(path).await
            }
            None => {
                warn!(
                    fragment = location.fragment.as_deref().unwrap_or(""),
                    "location did not resolve, keeping current path"
                );
                let epoch = self.epoch.load(Ordering::SeqCst);
                let current = self.current.read().clone();
                let view = self.resolve_view(&current).await;
                if self.is_current(epoch) {
                    self.renderer.render(&view);
                }
                view
            }
        }
    }

    /// History snapshot, most recent first.
    pub fn history_records(&self) -> Vec<HistoryRecord> {
        self.history.lock().list().to_vec()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    fn begin(&self, path: &NodePath) -> u64 {
        *self.current.write() = path.clone();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(path = %path, epoch, "navigation started");
        epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    // Resolves the node at `path` into a view, merging a pending sub-tree
    // first. Guards are released before every await.
    async fn resolve_view(&self, path: &NodePath) -> CatalogView {
        let pending = {
            let catalog = self.catalog.read();
            match catalog.node_at(path) {
                Some(Node::Branch(branch)) => branch.data_file.clone(),
                Some(Node::Leaf(_)) => None,
                None => {
                    warn!(path = %path, "path not found, rendering empty view");
                    return CatalogView::empty(path.clone());
                }
            }
        };

        if let Some(reference) = pending {
            match self.loader.resolve(&reference).await {
                Ok(fragment) => {
                    let mut catalog = self.catalog.write();
                    if let Some(branch) = catalog.branch_at_mut(path) {
                        // a concurrent navigation may have merged already
                        if branch.data_file.as_deref() == Some(reference.as_str()) {
                            branch.merge_fragment(fragment);
                            info!(path = %path, reference = %reference, "sub-tree merged");
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        path = %path,
                        reference = %reference,
                        error = %err,
                        "sub-tree fetch failed, rendering unmerged node"
                    );
                }
            }
        }

        let (node, doc) = {
            let catalog = self.catalog.read();
            match catalog.node_at(path) {
                Some(node) => (
                    node.clone(),
                    node.as_branch().and_then(|branch| branch.index_doc.clone()),
                ),
                None => return CatalogView::empty(path.clone()),
            }
        };

        let description = match doc {
            None => Description::Absent,
            Some(reference) => match self.source.fetch_document(&reference).await {
                Ok(text) => Description::Markdown(text),
                Err(err) => {
                    warn!(reference = %reference, error = %err, "description fetch failed");
                    Description::Unavailable
                }
            },
        };

        let waymark = self
            .index
            .id_for(path)
            .or_else(|| self.index.id_for_prefix_of(path));
        CatalogView::from_node(path.clone(), waymark, &node, description)
    }
}
