//! Session: the composition root
//!
//! Builds the content source described by configuration, fetches and indexes
//! the root content document, and wires the loader, history log, and
//! navigator together. The CLI talks to a `Session`; tests mostly talk to
//! the parts directly.

use crate::catalog::Catalog;
use crate::config::{ContentConfig, WaymarkConfig};
use crate::error::BrowseError;
use crate::fragment::{FragmentSink, Location};
use crate::history::{HistoryLog, HistoryStore};
use crate::loader::{PrefetchTasks, SubtreeLoader};
use crate::nav::Navigator;
use crate::render::Renderer;
use crate::source::{ContentSource, DirContentSource, HttpContentSource};
use crate::types::NodePath;
use crate::view::CatalogView;
use crate::index::WaymarkIndex;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the content source a configuration describes: HTTP when a base URL
/// is set, the local asset directory otherwise.
pub fn build_source(config: &ContentConfig) -> Arc<dyn ContentSource> {
    match &config.base_url {
        Some(base_url) => {
            Arc::new(HttpContentSource::new(base_url.clone()).with_doc_base(config.doc_base.clone()))
        }
        None => Arc::new(
            DirContentSource::new(config.asset_root.clone())
                .with_doc_base(config.doc_base.clone()),
        ),
    }
}

pub struct Session {
    config: WaymarkConfig,
    catalog: Arc<RwLock<Catalog>>,
    index: Arc<WaymarkIndex>,
    loader: Arc<SubtreeLoader>,
    navigator: Arc<Navigator>,
    prefetch: Mutex<PrefetchTasks>,
}

impl Session {
    /// Open a session from configuration alone, with the given presentation
    /// ports. Fetches the root content document before returning.
    pub async fn open(
        config: WaymarkConfig,
        renderer: Arc<dyn Renderer>,
        sink: Arc<dyn FragmentSink>,
    ) -> Result<Self, BrowseError> {
        let source = build_source(&config.content);
        let store: Arc<dyn HistoryStore> = Arc::new(config.history.store());
        Self::with_ports(config, source, store, renderer, sink).await
    }

    /// Open a session with every port injected.
    pub async fn with_ports(
        config: WaymarkConfig,
        source: Arc<dyn ContentSource>,
        store: Arc<dyn HistoryStore>,
        renderer: Arc<dyn Renderer>,
        sink: Arc<dyn FragmentSink>,
    ) -> Result<Self, BrowseError> {
        let root = source.fetch_subtree(&config.content.file).await?;
        let catalog = Catalog::from_branch(root);
        let index = Arc::new(WaymarkIndex::build(catalog.root_branch()));
        info!(
            reference = %config.content.file,
            indexed_paths = index.len(),
            "catalog loaded"
        );

        let history = HistoryLog::load(store, config.history.max_entries);
        let catalog = Arc::new(RwLock::new(catalog));
        let loader = Arc::new(
            SubtreeLoader::new(Arc::clone(&source))
                .with_stagger(Duration::from_millis(config.prefetch.stagger_ms)),
        );
        let navigator = Arc::new(Navigator::new(
            Arc::clone(&catalog),
            Arc::clone(&index),
            Arc::clone(&loader),
            source,
            history,
            renderer,
            sink,
        ));

        Ok(Self {
            config,
            catalog,
            index,
            loader,
            navigator,
            prefetch: Mutex::new(PrefetchTasks::none()),
        })
    }

    /// Navigate to the starting view: a deep-link location when one is
    /// given, the root otherwise.
    pub async fn start(&self, location: Option<&str>) -> CatalogView {
        match location {
            Some(raw) => self.navigator.on_url_changed(&Location::parse(raw)).await,
            None => self.navigator.navigate_to(NodePath::root()).await,
        }
    }

    /// Launch staggered background prefetch of every referenced sub-tree.
    /// Returns the number of tasks started; zero when prefetch is disabled.
    pub fn start_prefetch(&self) -> usize {
        if !self.config.prefetch.enabled {
            return 0;
        }
        let tasks = {
            let catalog = self.catalog.read();
            self.loader.prefetch_all(catalog.root_branch())
        };
        let started = tasks.len();
        if started > 0 {
            info!(tasks = started, "prefetch started");
        }
        *self.prefetch.lock() = tasks;
        started
    }

    /// Abort outstanding background work.
    pub fn shutdown(&self) {
        let tasks = std::mem::replace(&mut *self.prefetch.lock(), PrefetchTasks::none());
        if !tasks.is_empty() {
            info!(tasks = tasks.len(), "aborting outstanding prefetch tasks");
        }
        tasks.abort_all();
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn index(&self) -> &WaymarkIndex {
        &self.index
    }

    pub fn config(&self) -> &WaymarkConfig {
        &self.config
    }
}
