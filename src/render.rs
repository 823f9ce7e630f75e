//! Render port and the terminal presentation
//!
//! Markdown descriptions pass through verbatim: turning them into styled
//! output is the front end's concern, and the terminal front end simply
//! prints them.

use crate::history::HistoryRecord;
use crate::view::{CatalogView, Description, EntryKind, ViewContent};
use crate::index::WaymarkIndex;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Port for presenting the current catalog view.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &CatalogView);
}

/// Format a catalog view as human-readable text.
pub fn format_catalog_view_text(view: &CatalogView) -> String {
    let mut out = String::new();
    let location = match view.waymark {
        Some(id) => format!("{}  #{}", view.path, id),
        None => view.path.to_string(),
    };
    out.push_str(&format!("{}\n\n", location.bold().underline()));

    match &view.content {
        ViewContent::Empty => {
            out.push_str("No content here: the path does not exist or its data failed to load.\n");
        }
        ViewContent::Links { links } => {
            if links.is_empty() {
                out.push_str("No links.\n");
                return out;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Link", "Target"]);
            for link in links {
                table.add_row(vec![link.label.clone(), link.url.clone()]);
            }
            out.push_str(&format!("{}\n", table));
        }
        ViewContent::Listing {
            entries,
            description,
        } => {
            match description {
                Description::Markdown(text) => {
                    out.push_str(text.trim_end());
                    out.push_str("\n\n");
                }
                Description::Unavailable => {
                    out.push_str(&format!("{}\n\n", "Description unavailable.".dimmed()));
                }
                Description::Absent => {}
            }
            if entries.is_empty() {
                out.push_str("Empty category.\n");
                return out;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["", "Entry"]);
            for entry in entries {
                let icon = match entry.kind {
                    EntryKind::Folder => "📁",
                    EntryKind::Resource => "📄",
                };
                table.add_row(vec![icon.to_string(), entry.key.clone()]);
            }
            out.push_str(&format!("{}\n", table));
        }
    }
    out
}

/// Format the visit history as human-readable text, most recent first.
pub fn format_history_text(records: &[HistoryRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", "Visited".bold().underline()));
    if records.is_empty() {
        out.push_str("No history yet.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Title", "Path", "Waymark", "When"]);
    for (position, record) in records.iter().enumerate() {
        let waymark = record
            .url_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            (position + 1).to_string(),
            record.title.clone(),
            record.path.to_string(),
            waymark,
            record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Format the waymark index as human-readable text, ordered by waymark.
pub fn format_index_text(index: &WaymarkIndex) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", "Waymarks".bold().underline()));
    let mut rows: Vec<_> = index.iter().collect();
    rows.sort_by_key(|(id, _)| *id);
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Waymark", "Path"]);
    for (id, path) in rows {
        table.add_row(vec![id.to_string(), path.to_string()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Renderer printing to stdout.
#[derive(Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, view: &CatalogView) {
        println!("{}", format_catalog_view_text(view));
    }
}

/// Renderer that discards views. One-shot commands format the returned view
/// themselves instead of rendering along the way.
#[derive(Default)]
pub struct NullRenderer;

impl NullRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for NullRenderer {
    fn render(&self, _view: &CatalogView) {}
}
