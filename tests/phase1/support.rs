//! Shared fixtures for phase 1 contract tests.

use std::path::Path;
use waymark::config::WaymarkConfig;
use waymark::tooling::cli::CliContext;

pub const CONTENT: &str = r#"{
    "index": "home.md",
    "electronics": {
        "phones": { "flag": "1", "Fat Phone": "https://example.com/fat" },
        "laptops": {}
    },
    "books": { "dataFile": "data/books.json" }
}"#;

pub fn write_assets(dir: &Path) {
    std::fs::write(dir.join("content.json"), CONTENT).unwrap();
    std::fs::create_dir_all(dir.join("data")).unwrap();
    std::fs::write(
        dir.join("data/books.json"),
        r#"{"novels": {"flag": "1", "A Novel": "https://example.com/novel"}}"#,
    )
    .unwrap();
    std::fs::create_dir_all(dir.join("docs")).unwrap();
    std::fs::write(dir.join("docs/home.md"), "# Home\n").unwrap();
}

pub fn test_context(dir: &Path) -> CliContext {
    let mut config = WaymarkConfig::default();
    config.content.asset_root = dir.to_path_buf();
    config.history.file = Some(dir.join("history.cookie"));
    config.prefetch.enabled = false;
    CliContext::with_config(config)
}
