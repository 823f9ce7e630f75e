//! Lazy sub-tree loading with caching and background prefetch
//!
//! Sub-tree fragments are fetched at most once: resolved fragments are kept
//! raw in an in-memory cache and handed out as deep copies, with a
//! per-reference fetch lock so concurrent resolves of the same reference
//! issue a single fetch. Prefetch walks the initial tree and warms the same
//! cache from staggered background tasks, best-effort.

use crate::catalog::{Branch, Node};
use crate::error::FetchError;
use crate::source::ContentSource;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default delay between consecutive prefetch fetches.
pub const DEFAULT_PREFETCH_STAGGER_MS: u64 = 100;

/// Caching resolver for `dataFile` references.
pub struct SubtreeLoader {
    source: Arc<dyn ContentSource>,
    /// Raw fragments as fetched, keyed by reference.
    cache: RwLock<HashMap<String, Branch>>,
    /// Per-reference fetch locks; the map lock is never held across awaits.
    fetch_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    stagger: Duration,
}

impl SubtreeLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
            stagger: Duration::from_millis(DEFAULT_PREFETCH_STAGGER_MS),
        }
    }

    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Resolves a reference into a fully merged sub-tree.
    ///
    /// The fragment is fetched through the cache, then any `dataFile`
    /// references it carries (its own or a descendant's) are resolved
    /// through the same cache and merged in. Nested failures degrade to the
    /// unmerged child with the reference left in place; only a failure to
    /// fetch `reference` itself is surfaced, and nothing is cached for it.
    pub async fn resolve(&self, reference: &str) -> Result<Branch, FetchError> {
        let mut chain = HashSet::new();
        chain.insert(reference.to_string());
        let mut branch = self.fetch_raw(reference).await?;
        self.process(&mut branch, &mut chain).await;
        Ok(branch)
    }

    /// Whether a raw fragment for `reference` is already cached.
    pub fn is_cached(&self, reference: &str) -> bool {
        self.cache.read().contains_key(reference)
    }

    /// Spawns one staggered background fetch per reference reachable from
    /// `root`. Failures are logged and ignored; results land in the shared
    /// cache. The returned task set belongs to the session, which aborts it
    /// on teardown.
    pub fn prefetch_all(self: &Arc<Self>, root: &Branch) -> PrefetchTasks {
        let mut references = Vec::new();
        root.collect_data_files(&mut references);
        info!(count = references.len(), "starting background prefetch");

        let handles = references
            .into_iter()
            .enumerate()
            .map(|(position, reference)| {
                let loader = Arc::clone(self);
                let delay = loader.stagger * position as u32;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    match loader.fetch_raw(&reference).await {
                        Ok(_) => debug!(reference = %reference, "prefetched"),
                        Err(err) => {
                            warn!(reference = %reference, error = %err, "prefetch failed")
                        }
                    }
                })
            })
            .collect();
        PrefetchTasks { handles }
    }

    /// Cache-or-fetch of one raw fragment, single-flight per reference.
    async fn fetch_raw(&self, reference: &str) -> Result<Branch, FetchError> {
        if let Some(found) = self.cache.read().get(reference) {
            debug!(reference, "sub-tree cache hit");
            return Ok(found.clone());
        }

        let lock = self.fetch_lock(reference);
        let _guard = lock.lock().await;
        // re-check: another task may have fetched while we waited
        if let Some(found) = self.cache.read().get(reference) {
            return Ok(found.clone());
        }

        let fragment = self.source.fetch_subtree(reference).await?;
        self.cache
            .write()
            .insert(reference.to_string(), fragment.clone());
        info!(reference, "sub-tree cached");
        Ok(fragment)
    }

    fn fetch_lock(&self, reference: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.fetch_locks.lock();
        locks
            .entry(reference.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    // Recursive merge of nested references. `chain` holds every reference
    // already fetched in this resolve call, which both bounds the work and
    // breaks reference cycles.
    fn process<'a>(
        &'a self,
        branch: &'a mut Branch,
        chain: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Some(reference) = branch.data_file.clone() {
                if !chain.insert(reference.clone()) {
                    warn!(reference = %reference, "cyclic data file chain, skipping");
                } else {
                    match self.fetch_raw(&reference).await {
                        Ok(mut fragment) => {
                            self.process(&mut fragment, chain).await;
                            branch.merge_fragment(fragment);
                        }
                        Err(err) => {
                            warn!(
                                reference = %reference,
                                error = %err,
                                "nested sub-tree fetch failed, reference left in place"
                            );
                        }
                    }
                }
            }
            for (_, child) in branch.children.iter_mut() {
                if let Node::Branch(child_branch) = child {
                    self.process(child_branch, chain).await;
                }
            }
        })
    }
}

/// Handles of in-flight prefetch tasks.
pub struct PrefetchTasks {
    handles: Vec<JoinHandle<()>>,
}

impl PrefetchTasks {
    /// Empty set, for sessions with prefetch disabled.
    pub fn none() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aborts whatever has not completed yet.
    pub fn abort_all(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    /// Waits for every task to finish. Cancellations are expected after
    /// `abort_all`; anything else noisy enough to join unsuccessfully gets
    /// logged.
    pub async fn wait(self) {
        for result in futures::future::join_all(self.handles).await {
            if let Err(err) = result {
                if !err.is_cancelled() {
                    warn!(error = %err, "prefetch task failed to join");
                }
            }
        }
    }
}
