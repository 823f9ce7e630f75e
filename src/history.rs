//! Browsing history: capped, deduplicated, persisted cookie-style
//!
//! The log keeps the most recent visit per path, newest first, capped at a
//! fixed size. Persistence goes through the `HistoryStore` port; the
//! file-backed store writes a single cookie-formatted line (URL-encoded JSON
//! array payload with an expiry attribute), matching what a browser front
//! end would keep in an actual cookie.

use crate::error::HistoryError;
use crate::types::{NodePath, Waymark};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cookie name for the persisted history payload.
pub const DEFAULT_COOKIE_NAME: &str = "waymark_history";
/// Most entries the log will keep.
pub const DEFAULT_MAX_ENTRIES: usize = 50;
/// Days until a persisted payload expires.
pub const DEFAULT_EXPIRE_DAYS: i64 = 30;

/// One visited path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub path: NodePath,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Waymark the path resolved to when recorded (exact, else prefix
    /// fallback), used for rebuilding shareable links.
    #[serde(default)]
    pub url_id: Option<Waymark>,
}

/// Port for persisting history outside program memory.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError>;
    fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError>;
}

/// Capped, deduplicated browsing log.
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
    store: Arc<dyn HistoryStore>,
    max_entries: usize,
}

impl HistoryLog {
    /// Loads the log from its store. Unreadable or malformed persisted
    /// content degrades to an empty log.
    pub fn load(store: Arc<dyn HistoryStore>, max_entries: usize) -> Self {
        let mut records = match store.load() {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "persisted history unreadable, starting empty");
                Vec::new()
            }
        };
        records.truncate(max_entries);
        Self {
            records,
            store,
            max_entries,
        }
    }

    /// Records a visit: any previous record for the same path is removed,
    /// the new record goes to the head, and the tail is evicted past the
    /// cap. Persist failures are logged, never escalated.
    pub fn record(&mut self, path: NodePath, title: String, url_id: Option<Waymark>) {
        self.records.retain(|record| record.path != path);
        self.records.insert(
            0,
            HistoryRecord {
                path,
                title,
                timestamp: Utc::now(),
                url_id,
            },
        );
        self.records.truncate(self.max_entries);
        self.persist();
    }

    /// Records, most recent first.
    pub fn list(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.records) {
            warn!(error = %err, "failed to persist history");
        }
    }
}

/// File-backed store holding one cookie-formatted line:
/// `name=<url-encoded JSON array>; expires=<HTTP date>; path=/`.
pub struct CookieFileStore {
    path: PathBuf,
    name: String,
    expire_days: i64,
}

impl CookieFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: DEFAULT_COOKIE_NAME.to_string(),
            expire_days: DEFAULT_EXPIRE_DAYS,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_expire_days(mut self, days: i64) -> Self {
        self.expire_days = days;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform default location for the cookie file.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "waymark")
            .map(|dirs| dirs.data_local_dir().join("history.cookie"))
            .unwrap_or_else(|| PathBuf::from("waymark_history.cookie"))
    }

    fn parse(&self, raw: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or_default().trim();
        let (name, encoded) = pair.split_once('=').ok_or_else(|| {
            HistoryError::MalformedPersisted("missing name=value pair".to_string())
        })?;
        if name != self.name {
            return Err(HistoryError::MalformedPersisted(format!(
                "unexpected cookie name: {}",
                name
            )));
        }

        for attribute in parts {
            let Some((key, value)) = attribute.trim().split_once('=') else {
                continue;
            };
            if key.eq_ignore_ascii_case("expires") {
                if let Ok(expires) = DateTime::parse_from_rfc2822(value.trim()) {
                    if expires.with_timezone(&Utc) < Utc::now() {
                        debug!(path = %self.path.display(), "history cookie expired");
                        return Ok(Vec::new());
                    }
                }
            }
        }

        let decoded = urlencoding::decode(encoded)
            .map_err(|err| HistoryError::MalformedPersisted(err.to_string()))?;
        serde_json::from_str(&decoded)
            .map_err(|err| HistoryError::MalformedPersisted(err.to_string()))
    }
}

impl HistoryStore for CookieFileStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        self.parse(&raw)
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let payload = serde_json::to_string(records)?;
        let expires = (Utc::now() + chrono::Duration::days(self.expire_days))
            .format("%a, %d %b %Y %H:%M:%S GMT");
        let line = format!(
            "{}={}; expires={}; path=/",
            self.name,
            urlencoding::encode(&payload),
            expires
        );
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, line)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self.records.read().clone())
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        *self.records.write() = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_log() -> HistoryLog {
        HistoryLog::load(Arc::new(MemoryHistoryStore::new()), DEFAULT_MAX_ENTRIES)
    }

    fn path(segments: &[&str]) -> NodePath {
        NodePath::from(segments)
    }

    #[test]
    fn test_record_dedups_and_promotes_to_head() {
        let mut log = memory_log();
        log.record(path(&["x"]), "x".to_string(), Some(1));
        log.record(path(&["y"]), "y".to_string(), Some(2));
        log.record(path(&["x"]), "x".to_string(), Some(1));

        assert_eq!(log.len(), 2);
        assert_eq!(log.list()[0].path, path(&["x"]));
        assert_eq!(log.list()[1].path, path(&["y"]));
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut log = memory_log();
        for i in 0..60 {
            log.record(path(&[&format!("p{}", i)]), format!("p{}", i), None);
        }
        assert_eq!(log.len(), 50);
        assert_eq!(log.list()[0].path, path(&["p59"]));
        assert_eq!(log.list()[49].path, path(&["p10"]));
    }

    #[test]
    fn test_reload_round_trips_through_store() {
        let store = Arc::new(MemoryHistoryStore::new());
        let mut log = HistoryLog::load(store.clone(), DEFAULT_MAX_ENTRIES);
        log.record(path(&["a", "b"]), "a/b".to_string(), Some(11));
        drop(log);

        let reloaded = HistoryLog::load(store, DEFAULT_MAX_ENTRIES);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].path, path(&["a", "b"]));
        assert_eq!(reloaded.list()[0].url_id, Some(11));
    }

    #[test]
    fn test_persist_failure_is_swallowed() {
        struct FailingStore;
        impl HistoryStore for FailingStore {
            fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
                Ok(Vec::new())
            }
            fn save(&self, _: &[HistoryRecord]) -> Result<(), HistoryError> {
                Err(HistoryError::MalformedPersisted("disk gone".to_string()))
            }
        }

        let mut log = HistoryLog::load(Arc::new(FailingStore), DEFAULT_MAX_ENTRIES);
        log.record(path(&["x"]), "x".to_string(), None);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_record_serializes_in_cookie_shape() {
        let record = HistoryRecord {
            path: path(&["a", "b"]),
            title: "a/b".to_string(),
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            url_id: Some(11),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["path"], serde_json::json!(["a", "b"]));
        assert_eq!(value["timestamp"], serde_json::json!(1_700_000_000_000u64));
        assert_eq!(value["urlId"], serde_json::json!(11));
    }

    #[test]
    fn test_cookie_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieFileStore::new(dir.path().join("history.cookie"));
        let records = vec![HistoryRecord {
            path: path(&["tools", "editors"]),
            title: "tools/editors".to_string(),
            timestamp: Utc::now(),
            url_id: Some(21),
        }];
        store.save(&records).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("history.cookie")).unwrap();
        assert!(raw.starts_with("waymark_history="));
        assert!(raw.contains("expires="));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].path, records[0].path);
        assert_eq!(loaded[0].url_id, Some(21));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieFileStore::new(dir.path().join("absent.cookie"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_rejected_and_log_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("history.cookie");

        std::fs::write(&file, "waymark_history=%7B%22not%22%3A%22array%22%7D").unwrap();
        let store = CookieFileStore::new(&file);
        assert!(matches!(
            store.load().unwrap_err(),
            HistoryError::MalformedPersisted(_)
        ));

        let log = HistoryLog::load(Arc::new(store), DEFAULT_MAX_ENTRIES);
        assert!(log.is_empty());
    }

    #[test]
    fn test_unexpected_cookie_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("history.cookie");
        std::fs::write(&file, "other_cookie=%5B%5D").unwrap();
        assert!(matches!(
            CookieFileStore::new(&file).load().unwrap_err(),
            HistoryError::MalformedPersisted(_)
        ));
    }

    #[test]
    fn test_expired_cookie_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("history.cookie");
        let store = CookieFileStore::new(&file).with_expire_days(-1);
        store
            .save(&[HistoryRecord {
                path: path(&["x"]),
                title: "x".to_string(),
                timestamp: Utc::now(),
                url_id: None,
            }])
            .unwrap();

        assert!(store.load().unwrap().is_empty());
    }
}
