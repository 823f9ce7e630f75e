//! Waymark: Hierarchical Catalog Browsing
//!
//! A static-content catalog browser: a lazily-fetched content tree whose
//! paths carry stable numeric waymarks, with URL-fragment synchronization
//! and a persisted visit history.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fragment;
pub mod history;
pub mod index;
pub mod loader;
pub mod logging;
pub mod nav;
pub mod render;
pub mod session;
pub mod source;
pub mod tooling;
pub mod types;
pub mod view;
