//! # markread
//!
//! Command-line host for the link marking engine. Opens the local store,
//! runs the start-up sweep, and exposes the options-page operations plus
//! marking and checking of saved HTML pages.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};

use markread_engine::{
    runtime_channel, ClearOutcome, Coordinator, Document, HtmlDocument, LocalTabs, OptionsPage,
    PageAgent, PruneOutcome, RuntimeSender, SurfaceError, TriggerOutcome, MARKER_CLASS,
};
use markread_store::{Database, SqliteStorage, DEFAULT_QUOTA_BYTES};
use markread_telemetry::{init_telemetry, TelemetryConfig};

/// Mark links as read and keep track of them.
#[derive(Parser, Debug)]
#[command(name = "markread", about = "Mark links as read and keep track of them")]
struct Cli {
    /// Path to the `SQLite` store.
    #[arg(long, env = "MARKREAD_DB", global = true)]
    db: Option<PathBuf>,

    /// Default log level (trace, debug, info, warn, error).
    #[arg(long, env = "MARKREAD_LOG", default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how many links are stored and how much space they use.
    Stats,

    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Delete links older than the retention window.
    Prune,

    /// Erase every stored link and setting.
    Clear {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },

    /// Mark every link of a saved page as read.
    Mark {
        /// HTML file to load.
        file: PathBuf,
        /// Address the page was loaded from.
        #[arg(long)]
        url: String,
    },

    /// List the links of a saved page that are already marked read.
    Check {
        /// HTML file to load.
        file: PathBuf,
        /// Address the page was loaded from.
        #[arg(long)]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        /// Days to keep links; 0 keeps them forever.
        #[arg(long)]
        days: Option<String>,
        /// Highlight color for read links.
        #[arg(long)]
        color: Option<String>,
    },
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".markread").join("store.db")
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Keep the user-facing text on top of the error chain.
fn surface(e: SurfaceError) -> anyhow::Error {
    let text = e.user_message();
    anyhow::Error::new(e).context(text)
}

struct Host {
    storage: Arc<SqliteStorage>,
    tabs: Arc<LocalTabs<HtmlDocument>>,
    coordinator: Arc<Coordinator>,
    runtime: RuntimeSender,
}

impl Host {
    async fn start(db_path: &Path) -> Result<Self> {
        ensure_parent_dir(db_path)?;
        let db = Database::open(db_path)
            .with_context(|| format!("Failed to open store: {}", db_path.display()))?;
        info!(path = %db_path.display(), "store opened");

        let storage = Arc::new(SqliteStorage::new(db).with_quota(DEFAULT_QUOTA_BYTES));
        let tabs: Arc<LocalTabs<HtmlDocument>> = Arc::new(LocalTabs::new());
        let coordinator = Arc::new(Coordinator::new(storage.clone(), tabs.clone()));
        coordinator.on_startup().await;

        let (runtime, rx) = runtime_channel(32);
        coordinator.clone().serve(rx);

        Ok(Self {
            storage,
            tabs,
            coordinator,
            runtime,
        })
    }

    fn options(&self) -> OptionsPage {
        OptionsPage::new(self.storage.clone(), Arc::new(self.runtime.clone()))
    }

    async fn load_page(&self, file: &Path, url: &str) -> Result<PageAgent<HtmlDocument>> {
        let html = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read page: {}", file.display()))?;
        let doc = HtmlDocument::parse(&html, url)?;
        let mut agent = PageAgent::new(doc, self.storage.clone(), Arc::new(self.runtime.clone()));
        let marked = agent.initialize().await;
        debug!(marked, url, "page loaded");
        Ok(agent)
    }
}

fn marked_hrefs<D: Document>(doc: &D) -> (Vec<String>, usize) {
    let anchors = doc.anchors();
    let total = anchors.len();
    let marked = anchors
        .into_iter()
        .filter(|a| doc.has_class(a.index, MARKER_CLASS))
        .filter_map(|a| a.href)
        .collect();
    (marked, total)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level: Level = cli
        .log_level
        .parse()
        .map_err(|_| anyhow!("invalid log level: {}", cli.log_level))?;
    let _telemetry = init_telemetry(TelemetryConfig {
        log_level,
        json: cli.log_json,
        ..TelemetryConfig::default()
    });

    let db_path = cli.db.clone().unwrap_or_else(Cli::default_db_path);
    let host = Host::start(&db_path).await?;

    match cli.command {
        Command::Stats => {
            let stats = host.options().load_stats().await.map_err(surface)?;
            println!("{stats}");
        }
        Command::Settings {
            action: SettingsAction::Show,
        } => {
            let settings = host.options().load_settings().await.map_err(surface)?;
            if settings.pruning_enabled() {
                println!("Prune after days: {}", settings.prune_after_days);
            } else {
                println!("Prune after days: {} (pruning disabled)", settings.prune_after_days);
            }
            println!("Link color: {}", settings.link_color);
        }
        Command::Settings {
            action: SettingsAction::Set { days, color },
        } => {
            let options = host.options();
            let current = options.load_settings().await.map_err(surface)?;
            let days = days.unwrap_or_else(|| current.prune_after_days.to_string());
            let color = color.unwrap_or(current.link_color);
            let report = options.save_settings(&days, &color).await.map_err(surface)?;
            println!("{}", report.status.text);
            println!("Removed {} old links.", report.removed);
            if let Some(stats) = report.stats {
                println!("{stats}");
            }
        }
        Command::Prune => match host.coordinator.prune().await? {
            PruneOutcome::Disabled => println!("Pruning is disabled."),
            PruneOutcome::Swept { removed, .. } => println!("Removed {removed} old links."),
        },
        Command::Clear { yes } => match host.options().clear_all(yes).await.map_err(surface)? {
            ClearOutcome::Cancelled => println!("Nothing cleared; pass --yes to confirm."),
            ClearOutcome::Cleared { status, stats, .. } => {
                println!("{}", status.text);
                if let Some(stats) = stats {
                    println!("{stats}");
                }
            }
        },
        Command::Mark { file, url } => {
            let agent = host.load_page(&file, &url).await?;
            let tab = host.tabs.open(url.clone(), Some(agent));
            match host.coordinator.on_action_clicked(&tab).await {
                TriggerOutcome::Sent(_) => {}
                TriggerOutcome::Ignored => bail!("not an http(s) page: {url}"),
                TriggerOutcome::AgentUnavailable => bail!("page agent did not answer for {url}"),
            }
            let agent = host
                .tabs
                .agent(tab.id)
                .ok_or_else(|| anyhow!("tab closed while marking"))?;
            let agent = agent.lock().await;
            let (marked, total) = marked_hrefs(agent.document());
            println!("Marked {} of {total} links as read.", marked.len());
        }
        Command::Check { file, url } => {
            let agent = host.load_page(&file, &url).await?;
            let (marked, total) = marked_hrefs(agent.document());
            for href in &marked {
                println!("{href}");
            }
            println!("{} of {total} links already read.", marked.len());
        }
    }

    Ok(())
}
