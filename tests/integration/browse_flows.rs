//! End-to-end browsing flows: navigation, lazy merge, deep links, and
//! fragment synchronization against an on-disk catalog.

use crate::support;
use waymark::fragment::FragmentSink;
use waymark::types::NodePath;
use waymark::view::{Description, ViewContent};

#[tokio::test]
async fn walks_into_categories_and_merges_referenced_subtrees() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    let view = session.start(None).await;
    assert!(view.path.is_root());
    assert_eq!(view.entries().len(), 3);
    assert_eq!(sink.current(), Some("0".to_string()));
    match &view.content {
        ViewContent::Listing { description, .. } => {
            assert_eq!(description, &Description::Markdown("# Welcome\n".to_string()));
        }
        other => panic!("expected a listing at the root, got {:?}", other),
    }

    let view = session
        .navigator()
        .navigate_to(NodePath::from(&["electronics"][..]))
        .await;
    assert_eq!(view.waymark, Some(1));
    assert_eq!(view.entries().len(), 2);
    assert_eq!(sink.current(), Some("1".to_string()));

    // accessories carries a dataFile reference that merges on first visit
    let view = session
        .navigator()
        .navigate_to(NodePath::from(&["electronics", "accessories"][..]))
        .await;
    assert_eq!(view.waymark, Some(12));
    let keys: Vec<&str> = view.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["cables", "cases"]);
    assert_eq!(sink.current(), Some("12".to_string()));

    // merged children are navigable but carry no waymark of their own,
    // so the fragment degrades to the longest indexed prefix
    let view = session
        .navigator()
        .navigate_to(NodePath::from(&["electronics", "accessories", "cases"][..]))
        .await;
    assert_eq!(view.waymark, Some(12));
    assert!(view.entries().is_empty());
    assert_eq!(sink.current(), Some("12".to_string()));

    let records = session.navigator().history_records();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["electronics/accessories", "electronics/accessories", "electronics", "Home"]
    );
}

#[tokio::test]
async fn leaf_views_list_links() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    let view = session
        .navigator()
        .navigate_to(NodePath::from(&["electronics", "phones", "smart"][..]))
        .await;
    assert_eq!(view.waymark, Some(111));
    assert_eq!(sink.current(), Some("111".to_string()));
    let links: Vec<(&str, &str)> = view
        .links()
        .iter()
        .map(|link| (link.label.as_str(), link.url.as_str()))
        .collect();
    assert_eq!(
        links,
        vec![
            ("Model A", "https://example.com/a"),
            ("Model B", "https://example.com/b"),
        ]
    );
}

#[tokio::test]
async fn deep_link_fragment_restores_path() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    let view = session.start(Some("#111")).await;
    assert_eq!(
        view.path,
        NodePath::from(&["electronics", "phones", "smart"][..])
    );
    assert_eq!(sink.current(), Some("111".to_string()));

    let records = session.navigator().history_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url_id, Some(111));
}

#[tokio::test]
async fn legacy_query_deep_link_resolves_and_yields_fragment() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    // ?path=["books"] in the pre-waymark URL scheme
    let view = session.start(Some("?path=%5B%22books%22%5D")).await;
    assert_eq!(view.path, NodePath::from(&["books"][..]));
    assert_eq!(sink.current(), Some("2".to_string()));
}

#[tokio::test]
async fn unresolvable_deep_link_keeps_root() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    let view = session.start(Some("#99999")).await;
    assert!(view.path.is_root());
    assert_eq!(sink.current(), None);
    assert!(session.navigator().history_records().is_empty());
}

#[tokio::test]
async fn fragment_sync_replaces_and_never_pushes() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    session.start(None).await;
    session
        .navigator()
        .navigate_to(NodePath::from(&["books"][..]))
        .await;
    session
        .navigator()
        .navigate_to(NodePath::from(&["books"][..]))
        .await;
    session.navigator().navigate_up(0).await;

    assert!(sink.replace_count() >= 4);
    assert_eq!(sink.push_count(), 0);
    assert_eq!(sink.current(), Some("0".to_string()));
}

#[tokio::test]
async fn revisits_move_to_history_head_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, _sink) = support::open_session(dir.path()).await;

    let books = NodePath::from(&["books"][..]);
    let about = NodePath::from(&["about"][..]);
    session.navigator().navigate_to(books.clone()).await;
    session.navigator().navigate_to(about.clone()).await;
    session.navigator().navigate_to(books.clone()).await;

    let records = session.navigator().history_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, books);
    assert_eq!(records[1].path, about);
}

#[tokio::test]
async fn absent_path_renders_empty_view_and_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    support::write_catalog(dir.path());
    let (session, sink) = support::open_session(dir.path()).await;

    let view = session
        .navigator()
        .navigate_to(NodePath::from(&["nonexistent"][..]))
        .await;
    assert!(view.is_empty());
    assert!(session.navigator().history_records().is_empty());
    // The fragment still follows the attempted path as far as the index
    // can take it.
    assert_eq!(sink.current(), Some("0".to_string()));
}
