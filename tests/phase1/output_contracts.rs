use tempfile::TempDir;

use waymark::tooling::cli::{Commands, HistoryCommands};

use crate::support::{test_context, write_assets};

#[tokio::test]
async fn history_list_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    // A visit through show is what populates the persisted history.
    cli.execute(&Commands::Show {
        at: None,
        path: Some("electronics/phones".to_string()),
    })
    .await
    .unwrap();

    let output = cli
        .execute(&Commands::History {
            command: HistoryCommands::List {
                format: "json".to_string(),
            },
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let records = parsed.as_array().expect("history output should be an array");
    assert_eq!(records.len(), 1);

    let entry = &records[0];
    assert_eq!(
        entry.get("path"),
        Some(&serde_json::json!(["electronics", "phones"]))
    );
    assert_eq!(
        entry.get("title").and_then(|v| v.as_str()),
        Some("electronics/phones")
    );
    assert_eq!(entry.get("urlId").and_then(|v| v.as_u64()), Some(11));
    assert!(entry.get("timestamp").and_then(|v| v.as_i64()).is_some());
}

#[tokio::test]
async fn history_list_rejects_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    let result = cli
        .execute(&Commands::History {
            command: HistoryCommands::List {
                format: "yaml".to_string(),
            },
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn show_text_contract_carries_path_and_waymark() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    let output = cli
        .execute(&Commands::Show {
            at: None,
            path: Some("electronics/phones".to_string()),
        })
        .await
        .unwrap();

    assert!(output.contains("/electronics/phones"));
    assert!(output.contains("#11"));
    assert!(output.contains("Fat Phone"));
    assert!(output.contains("https://example.com/fat"));
}

#[tokio::test]
async fn show_root_renders_description_and_listing() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    let output = cli
        .execute(&Commands::Show {
            at: None,
            path: None,
        })
        .await
        .unwrap();

    assert!(output.contains("# Home"));
    assert!(output.contains("electronics"));
    assert!(output.contains("books"));
    assert!(output.contains("#0"));
}

#[tokio::test]
async fn index_output_lists_every_waymark_once() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    let output = cli.execute(&Commands::Index).await.unwrap();

    for (waymark, path) in [
        ("0", "/"),
        ("1", "/electronics"),
        ("2", "/books"),
        ("11", "/electronics/phones"),
        ("12", "/electronics/laptops"),
    ] {
        assert!(
            output.contains(waymark) && output.contains(path),
            "index output should list {} -> {}",
            waymark,
            path
        );
    }
    // the books sub-tree is lazy, so its children are not indexed
    assert!(!output.contains("novels"));
}

#[tokio::test]
async fn resolve_output_pairs_path_with_waymark() {
    let temp_dir = TempDir::new().unwrap();
    write_assets(temp_dir.path());
    let cli = test_context(temp_dir.path());

    let output = cli
        .execute(&Commands::Resolve {
            location: "#12".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(output, "/electronics/laptops  #12");

    let result = cli
        .execute(&Commands::Resolve {
            location: "#404".to_string(),
        })
        .await;
    assert!(result.is_err());
}
