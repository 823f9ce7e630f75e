//! CLI Tooling
//!
//! Command-line interface for browsing a waymark catalog. One-shot commands
//! open a session, run a single operation, and print the result; `browse`
//! keeps the session alive behind an interactive menu.

use crate::config::WaymarkConfig;
use crate::error::{BrowseError, HistoryError};
use crate::fragment::{FragmentSink, Location, MemoryFragmentSink};
use crate::history::{HistoryLog, HistoryStore};
use crate::logging;
use crate::render::{
    format_catalog_view_text, format_history_text, format_index_text, NullRenderer, Renderer,
    TerminalRenderer,
};
use crate::session::Session;
use crate::types::NodePath;
use crate::view::{CatalogView, EntryKind};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Waymark CLI - Catalog browsing with stable numeric waymarks
#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Browse a hierarchical content catalog addressed by numeric waymarks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the catalog interactively
    Browse {
        /// Starting location: a waymark or a '#fragment'
        #[arg(long)]
        at: Option<String>,
        /// Skip background prefetch of referenced sub-trees
        #[arg(long)]
        no_prefetch: bool,
    },
    /// Print a single catalog view and exit
    Show {
        /// Location to show: a waymark or a '#fragment'
        #[arg(long)]
        at: Option<String>,
        /// Path to show, slash-separated (e.g. electronics/phones)
        #[arg(long)]
        path: Option<String>,
    },
    /// Resolve a location to a catalog path
    Resolve {
        /// Location, e.g. '#11' or '?path=%5B%22a%22%5D'
        location: String,
    },
    /// Look up the waymark assigned to a path
    Id {
        /// Slash-separated path
        path: String,
        /// Fall back to the longest indexed prefix
        #[arg(long)]
        prefix: bool,
    },
    /// Print the waymark index
    Index,
    /// History commands (list, clear)
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        /// Target path
        #[arg(long, default_value = "waymark.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List visited paths, most recent first
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Clear the visit history
    Clear,
}

/// One menu row in the interactive browser.
enum MenuAction {
    Enter(String, EntryKind),
    Up,
    Home,
    History,
    Quit,
}

impl MenuAction {
    fn label(&self) -> String {
        match self {
            MenuAction::Enter(key, EntryKind::Folder) => format!("📁 {}", key),
            MenuAction::Enter(key, EntryKind::Resource) => format!("📄 {}", key),
            MenuAction::Up => "Up".to_string(),
            MenuAction::Home => "Home".to_string(),
            MenuAction::History => "History".to_string(),
            MenuAction::Quit => "Quit".to_string(),
        }
    }
}

fn menu_actions(view: &CatalogView, at_root: bool) -> Vec<MenuAction> {
    let mut actions: Vec<MenuAction> = view
        .entries()
        .iter()
        .map(|entry| MenuAction::Enter(entry.key.clone(), entry.kind))
        .collect();
    if !at_root {
        actions.push(MenuAction::Up);
        actions.push(MenuAction::Home);
    }
    actions.push(MenuAction::History);
    actions.push(MenuAction::Quit);
    actions
}

/// `--at 11` and `--at '#11'` both mean fragment 11; anything already
/// carrying a fragment or query passes through unchanged.
fn normalize_location(at: Option<&str>) -> Option<String> {
    at.map(|raw| {
        if raw.contains('#') || raw.contains('?') {
            raw.to_string()
        } else {
            format!("#{}", raw)
        }
    })
}

fn parse_path(raw: &str) -> NodePath {
    let segments: Vec<String> = raw
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    NodePath::from(segments)
}

/// CLI execution context: configuration plus the terminal front end's
/// address bar.
pub struct CliContext {
    config: WaymarkConfig,
    sink: Arc<MemoryFragmentSink>,
}

impl CliContext {
    /// Create a CLI context. `init` falls back to a default configuration so
    /// it can run before a readable configuration file exists.
    pub fn new(cli: &Cli) -> Result<Self, BrowseError> {
        let config = match WaymarkConfig::load(cli.config.as_deref()) {
            Ok(config) => config,
            Err(_) if matches!(cli.command, Commands::Init { .. }) => WaymarkConfig::default(),
            Err(err) => return Err(err),
        };
        Ok(Self::with_config(config))
    }

    /// Create a CLI context from an already-loaded configuration.
    pub fn with_config(config: WaymarkConfig) -> Self {
        Self {
            config,
            sink: Arc::new(MemoryFragmentSink::new()),
        }
    }

    pub fn config(&self) -> &WaymarkConfig {
        &self.config
    }

    /// Initialize logging from configuration plus command-line overrides.
    /// Called once, by the binary.
    pub fn init_logging(&self, cli: &Cli) -> Result<(), BrowseError> {
        let mut config = self.config.logging.clone();
        if let Some(level) = &cli.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            config.output = output.clone();
        }
        if cli.log_file.is_some() || config.file.is_some() {
            config.file = Some(logging::resolve_log_file_path(
                cli.log_file.clone(),
                config.file.take(),
            )?);
        }
        logging::init_logging(&config)
    }

    /// Execute a CLI command, returning its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, BrowseError> {
        match command {
            Commands::Browse { at, no_prefetch } => {
                self.handle_browse(at.as_deref(), *no_prefetch).await
            }
            Commands::Show { at, path } => self.handle_show(at.as_deref(), path.as_deref()).await,
            Commands::Resolve { location } => self.handle_resolve(location).await,
            Commands::Id { path, prefix } => self.handle_id(path, *prefix).await,
            Commands::Index => self.handle_index().await,
            Commands::History { command } => self.handle_history(command),
            Commands::Init { force, path } => self.handle_init(*force, path),
        }
    }

    async fn open_session(&self, renderer: Arc<dyn Renderer>) -> Result<Session, BrowseError> {
        Session::open(
            self.config.clone(),
            renderer,
            Arc::clone(&self.sink) as Arc<dyn FragmentSink>,
        )
        .await
    }

    async fn handle_browse(
        &self,
        at: Option<&str>,
        no_prefetch: bool,
    ) -> Result<String, BrowseError> {
        use dialoguer::Select;

        let session = self.open_session(Arc::new(TerminalRenderer::new())).await?;
        let mut view = session.start(normalize_location(at).as_deref()).await;
        if !no_prefetch {
            session.start_prefetch();
        }

        loop {
            let current = session.navigator().current_path();
            let actions = menu_actions(&view, current.is_root());
            let items: Vec<String> = actions.iter().map(MenuAction::label).collect();
            let prompt = match self.sink.current().filter(|f| !f.is_empty()) {
                Some(fragment) => format!("{}  #{}", current, fragment),
                None => current.to_string(),
            };

            let selection = Select::new()
                .with_prompt(prompt)
                .items(&items)
                .default(0)
                .interact()
                .map_err(|e| {
                    BrowseError::ConfigError(format!("Failed to get user input: {}", e))
                })?;

            match &actions[selection] {
                MenuAction::Enter(key, _) => {
                    view = session.navigator().navigate_to(current.child(key)).await;
                }
                MenuAction::Up => {
                    view = session
                        .navigator()
                        .navigate_up(current.len().saturating_sub(1))
                        .await;
                }
                MenuAction::Home => {
                    view = session.navigator().navigate_to(NodePath::root()).await;
                }
                MenuAction::History => {
                    println!("{}", format_history_text(&session.navigator().history_records()));
                }
                MenuAction::Quit => break,
            }
        }

        session.shutdown();
        Ok("Goodbye.".to_string())
    }

    async fn handle_show(
        &self,
        at: Option<&str>,
        path: Option<&str>,
    ) -> Result<String, BrowseError> {
        let session = self.open_session(Arc::new(NullRenderer::new())).await?;
        let view = match path {
            Some(raw) => session.navigator().navigate_to(parse_path(raw)).await,
            None => session.start(normalize_location(at).as_deref()).await,
        };
        Ok(format_catalog_view_text(&view))
    }

    async fn handle_resolve(&self, raw: &str) -> Result<String, BrowseError> {
        let session = self.open_session(Arc::new(NullRenderer::new())).await?;
        let location = Location::parse(raw);
        match location.resolve(session.index()) {
            Some(path) => Ok(match session.index().id_for(&path) {
                Some(id) => format!("{}  #{}", path, id),
                None => path.to_string(),
            }),
            None => Err(BrowseError::PathNotFound(raw.to_string())),
        }
    }

    async fn handle_id(&self, raw: &str, prefix: bool) -> Result<String, BrowseError> {
        let session = self.open_session(Arc::new(NullRenderer::new())).await?;
        let path = parse_path(raw);
        let id = session.index().id_for(&path).or_else(|| {
            if prefix {
                session.index().id_for_prefix_of(&path)
            } else {
                None
            }
        });
        match id {
            Some(id) => Ok(id.to_string()),
            None => Err(BrowseError::PathNotFound(path.to_string())),
        }
    }

    async fn handle_index(&self) -> Result<String, BrowseError> {
        let session = self.open_session(Arc::new(NullRenderer::new())).await?;
        Ok(format_index_text(session.index()))
    }

    // History is store-backed, not content-backed, so these never open a
    // session.
    fn handle_history(&self, command: &HistoryCommands) -> Result<String, BrowseError> {
        let store: Arc<dyn HistoryStore> = Arc::new(self.config.history.store());
        let mut log = HistoryLog::load(store, self.config.history.max_entries);
        match command {
            HistoryCommands::List { format } => match format.as_str() {
                "text" => Ok(format_history_text(log.list())),
                "json" => Ok(serde_json::to_string_pretty(log.list())
                    .map_err(HistoryError::from)?),
                other => Err(BrowseError::ConfigError(format!(
                    "Invalid format: {} (must be 'text' or 'json')",
                    other
                ))),
            },
            HistoryCommands::Clear => {
                let removed = log.len();
                log.clear();
                Ok(format!("Cleared {} history entries.", removed))
            }
        }
    }

    fn handle_init(&self, force: bool, path: &Path) -> Result<String, BrowseError> {
        if path.exists() && !force {
            return Err(BrowseError::ConfigError(format!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            )));
        }
        let rendered = WaymarkConfig::default_toml()?;
        std::fs::write(path, rendered).map_err(|e| {
            BrowseError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(format!("Wrote default configuration to {}", path.display()))
    }
}
