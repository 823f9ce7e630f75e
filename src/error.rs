//! Error types for catalog navigation
//!
//! Fetch and history failures are recoverable by design: the navigator
//! degrades to an empty or unmerged view and the history log degrades to
//! empty, so none of these ever abort an interactive session.

use thiserror::Error;

/// Failure to fetch a content asset (sub-tree data file or document).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to read {reference}: {source}")]
    IoError {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("unexpected status {status} for {reference}")]
    StatusError { reference: String, status: u16 },

    #[error("malformed content in {reference}: {source}")]
    MalformedContent {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure in the persisted history layer.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history store error: {0}")]
    StoreError(#[from] std::io::Error),

    #[error("malformed persisted history: {0}")]
    MalformedPersisted(String),

    #[error("failed to encode history: {0}")]
    EncodeError(#[from] serde_json::Error),
}

/// Top-level error for catalog browsing operations.
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("history error: {0}")]
    HistoryError(#[from] HistoryError),

    #[error("config error: {0}")]
    ConfigError(String),
}
