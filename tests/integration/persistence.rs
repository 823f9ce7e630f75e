//! History persistence across sessions: the cookie-style file survives a
//! restart, expires on schedule, and degrades to empty when malformed.

use crate::support;
use waymark::history::{CookieFileStore, HistoryLog, HistoryStore};
use waymark::types::NodePath;
use std::sync::Arc;

#[tokio::test]
async fn history_survives_a_session_restart() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());

    {
        let (session, _sink) = support::open_session(dir.path()).await;
        session
            .navigator()
            .navigate_to(NodePath::from(&["books"][..]))
            .await;
        session
            .navigator()
            .navigate_to(NodePath::from(&["about"][..]))
            .await;
    }

    let (session, _sink) = support::open_session(dir.path()).await;
    let records = session.navigator().history_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, NodePath::from(&["about"][..]));
    assert_eq!(records[0].url_id, Some(3));
    assert_eq!(records[1].path, NodePath::from(&["books"][..]));
}

#[tokio::test]
async fn expired_payload_loads_as_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let cookie = dir.path().join("history.cookie");

    // Persist one record through a store that expires immediately.
    let store: Arc<dyn HistoryStore> =
        Arc::new(CookieFileStore::new(&cookie).with_expire_days(-1));
    let mut log = HistoryLog::load(Arc::clone(&store), 50);
    log.record(NodePath::from(&["books"][..]), "books".to_string(), Some(2));
    assert!(cookie.exists());

    let (session, _sink) = support::open_session(dir.path()).await;
    assert!(session.navigator().history_records().is_empty());
}

#[tokio::test]
async fn malformed_payload_degrades_to_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    std::fs::write(dir.path().join("history.cookie"), "not a cookie at all").unwrap();

    let (session, _sink) = support::open_session(dir.path()).await;
    assert!(session.navigator().history_records().is_empty());

    // Recording overwrites the malformed payload with a valid one.
    session
        .navigator()
        .navigate_to(NodePath::from(&["books"][..]))
        .await;
    drop(session);

    let (session, _sink) = support::open_session(dir.path()).await;
    let records = session.navigator().history_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, NodePath::from(&["books"][..]));
}

#[tokio::test]
async fn history_cap_applies_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());

    let mut config = support::config_for(dir.path());
    config.history.max_entries = 2;
    {
        let (session, _sink) = support::open_session_with(config.clone()).await;
        session
            .navigator()
            .navigate_to(NodePath::from(&["books"][..]))
            .await;
        session
            .navigator()
            .navigate_to(NodePath::from(&["about"][..]))
            .await;
        session
            .navigator()
            .navigate_to(NodePath::from(&["electronics"][..]))
            .await;
    }

    let (session, _sink) = support::open_session_with(config).await;
    let records = session.navigator().history_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, NodePath::from(&["electronics"][..]));
    assert_eq!(records[1].path, NodePath::from(&["about"][..]));
}
