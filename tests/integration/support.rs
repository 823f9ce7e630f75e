//! Shared fixtures: a catalog asset directory and session construction.

use std::path::Path;
use std::sync::Arc;
use waymark::config::WaymarkConfig;
use waymark::fragment::{FragmentSink, MemoryFragmentSink};
use waymark::render::NullRenderer;
use waymark::session::Session;

pub const CONTENT: &str = r#"{
    "index": "home.md",
    "electronics": {
        "index": "electronics.md",
        "phones": {
            "smart": {
                "flag": "1",
                "Model A": "https://example.com/a",
                "Model B": "https://example.com/b"
            },
            "feature": { "flag": "1", "Classic": "https://example.com/c" }
        },
        "accessories": { "dataFile": "data/accessories.json" }
    },
    "books": {
        "fiction": {},
        "nonfiction": { "flag": "1", "Biography": "https://example.com/bio" }
    },
    "about": { "flag": "1", "Site": "https://example.com" }
}"#;

pub const ACCESSORIES: &str = r#"{
    "cables": { "flag": "1", "USB Cable": "https://example.com/usb" },
    "cases": {}
}"#;

pub fn write_catalog(dir: &Path) {
    std::fs::write(dir.join("content.json"), CONTENT).unwrap();
    std::fs::create_dir_all(dir.join("data")).unwrap();
    std::fs::write(dir.join("data/accessories.json"), ACCESSORIES).unwrap();
    std::fs::create_dir_all(dir.join("docs")).unwrap();
    std::fs::write(dir.join("docs/home.md"), "# Welcome\n").unwrap();
    std::fs::write(dir.join("docs/electronics.md"), "# Electronics\n").unwrap();
}

pub fn config_for(dir: &Path) -> WaymarkConfig {
    let mut config = WaymarkConfig::default();
    config.content.asset_root = dir.to_path_buf();
    config.history.file = Some(dir.join("history.cookie"));
    config.prefetch.enabled = false;
    config
}

pub async fn open_session(dir: &Path) -> (Session, Arc<MemoryFragmentSink>) {
    open_session_with(config_for(dir)).await
}

pub async fn open_session_with(config: WaymarkConfig) -> (Session, Arc<MemoryFragmentSink>) {
    let sink = Arc::new(MemoryFragmentSink::new());
    let session = Session::open(
        config,
        Arc::new(NullRenderer::new()),
        Arc::clone(&sink) as Arc<dyn FragmentSink>,
    )
    .await
    .expect("session should open against the fixture catalog");
    (session, sink)
}
