//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Emoji};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use quote_sync::store::EXPORT_FILE_NAME;
use quote_sync::{
    CategoryFilter, Config, NotificationSink, PullOutcome, QuoteBook, Record, Severity,
    StatusBoard, SyncEvent,
};

static CHECK: Emoji = Emoji("✓ ", "* ");
static CROSS: Emoji = Emoji("✗ ", "x ");
static ARROW: Emoji = Emoji("→ ", "-> ");
static INFO: Emoji = Emoji("ℹ ", "i ");

#[derive(Parser)]
#[command(name = "quote-sync")]
#[command(author, version, about = "Local-first quote collection with server sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the storage directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the server base URL
    #[arg(long, global = true)]
    pub remote_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a random quote
    Show {
        /// Category to pick from (default: last applied filter)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List quotes
    List {
        /// Only quotes in this category ("all" for every quote)
        #[arg(short, long)]
        category: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories
    Categories,

    /// Apply and remember a category filter
    Filter {
        /// Category name, or "all"
        category: String,
    },

    /// Add a quote and offer it to the server
    Add {
        /// Quote text
        text: String,

        /// Quote category
        #[arg(short, long)]
        category: String,
    },

    /// Import quotes from a JSON file
    Import {
        /// File containing a JSON array of quotes
        file: PathBuf,
    },

    /// Export all quotes to a JSON file
    Export {
        /// Output path
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },

    /// Pull new quotes from the server once
    Sync,

    /// Keep syncing periodically until interrupted
    Watch,

    /// Interactive session with background sync
    Shell,

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

/// Status line on the terminal; keeps the visible message in a board
pub struct TerminalSink {
    board: StatusBoard,
}

impl TerminalSink {
    pub fn new(config: &Config) -> Self {
        Self {
            board: StatusBoard::with_window(config.notify.display_window()),
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }
}

impl NotificationSink for TerminalSink {
    fn display(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => eprintln!("{}{}", INFO, style(message).cyan()),
            Severity::Success => eprintln!("{}{}", CHECK, style(message).green()),
            Severity::Error => eprintln!("{}{}", CROSS, style(message).red()),
        }
        self.board.display(message, severity);
    }
}

/// Load config and apply command line overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config file")?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(url) = &cli.remote_url {
        config.remote.base_url = url.clone();
    }
    Ok(config)
}

fn open_book(config: &Config, sink: Arc<TerminalSink>) -> Result<QuoteBook> {
    QuoteBook::open(config, sink, |_| {}).context("Failed to open quote store")
}

fn print_record(record: &Record) {
    println!("\"{}\"", style(&record.text).bold());
    println!("  - {}", style(&record.category).dim());
}

fn print_empty(filter: &CategoryFilter) {
    match filter {
        CategoryFilter::All => println!("No quotes available. Add one!"),
        CategoryFilter::Only(category) => {
            println!("No quotes found in category: \"{}\"", category)
        }
    }
}

fn resolve_filter(book: &QuoteBook, category: Option<String>) -> CategoryFilter {
    match category {
        Some(value) => CategoryFilter::parse(&value),
        None => book.current_filter(),
    }
}

pub async fn show_quote(config: &Config, category: Option<String>) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    let filter = resolve_filter(&book, category);

    match book.show_random(&filter) {
        Some(record) => print_record(&record),
        None => print_empty(&filter),
    }
    Ok(())
}

pub async fn list_quotes(config: &Config, category: Option<String>, json: bool) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    let filter = category.map(|c| CategoryFilter::parse(&c)).unwrap_or_default();
    let records = book.list(&filter);

    if json {
        println!("{}", quote_sync::store::export_json(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        print_empty(&filter);
    }
    for record in &records {
        println!("{}{} {}", ARROW, record.text, style(format!("[{}]", record.category)).dim());
    }
    Ok(())
}

pub async fn list_categories(config: &Config) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    for category in book.categories() {
        println!("{}", category);
    }
    Ok(())
}

pub async fn set_filter(config: &Config, category: &str) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    let filter = book.apply_filter(category);
    println!("{}Filter set to {}", CHECK, style(&filter).bold());
    Ok(())
}

pub async fn add_quote(config: &Config, text: &str, category: &str) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;

    let push = match book.add_quote(text, category) {
        Ok(push) => push,
        // Already reported on the status line
        Err(_) => std::process::exit(1),
    };
    println!("{}New quote added locally!", CHECK);

    // Wait for the push so its outcome is reported before exit
    if let Err(e) = push.await {
        tracing::warn!("Push task failed: {}", e);
    }
    Ok(())
}

pub async fn import_quotes(config: &Config, file: &Path) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    if book.import_file(file).is_err() {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn export_quotes(config: &Config, output: &Path) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;
    book.export_file(output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!("{}Exported {} quotes to {}", CHECK, book.list(&CategoryFilter::All).len(), output.display());
    Ok(())
}

pub async fn sync_once(config: &Config) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;

    match book.sync_now().await {
        PullOutcome::Merged(added) => println!("{}Added {} new quotes", ARROW, added),
        PullOutcome::UpToDate | PullOutcome::Skipped => {}
        PullOutcome::Failed => std::process::exit(1),
    }
    Ok(())
}

pub async fn watch(config: &Config) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let book = open_book(config, sink)?;

    let periodic = book.start_periodic(&config.sync);
    info!("Watching; press Ctrl+C to stop");
    shutdown_signal().await;
    periodic.stop().await;

    let stats = book.engine().stats();
    println!(
        "{}{} pulls ({} failed), {} quotes merged",
        INFO, stats.total_pulls, stats.failed_pulls, stats.records_merged
    );
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  show [category]        random quote (\"all\" for every category)
  again                  show the last quote again
  add <category> <text>  add a quote
  filter <category>      apply and remember a filter
  categories             list categories
  list                   list quotes matching the filter
  sync                   pull from the server now
  import <file>          import a JSON array of quotes
  export [file]          export all quotes
  status                 current status message
  stats                  sync statistics
  quit                   leave the session";

pub async fn shell(config: &Config) -> Result<()> {
    let sink = Arc::new(TerminalSink::new(config));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let book = QuoteBook::open(config, sink.clone(), move |event| {
        let _ = events_tx.send(event);
    })
    .context("Failed to open quote store")?;

    let periodic = config.sync.enabled.then(|| book.start_periodic(&config.sync));
    let mut filter = book.current_filter();

    println!("{}Filter: {} (type \"help\" for commands)", INFO, style(&filter).bold());
    if let Some(record) = book.show_random(&filter) {
        print_record(&record);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !run_shell_line(&book, sink.as_ref(), &mut filter, line.trim()).await {
                    break;
                }
            }
            Some(event) = events_rx.recv() => {
                // Server data changed: refresh category view
                if let SyncEvent::Completed { .. } = event {
                    println!("{}Categories: {}", ARROW, book.categories().join(", "));
                }
            }
            _ = &mut shutdown => break,
        }
    }

    if let Some(periodic) = periodic {
        periodic.stop().await;
    }
    Ok(())
}

/// Handle one shell line; `false` ends the session
async fn run_shell_line(
    book: &QuoteBook,
    sink: &TerminalSink,
    filter: &mut CategoryFilter,
    line: &str,
) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "help" => println!("{}", SHELL_HELP),
        "quit" | "exit" => return false,
        "show" => {
            let wanted = if rest.is_empty() { filter.clone() } else { CategoryFilter::parse(rest) };
            match book.show_random(&wanted) {
                Some(record) => print_record(&record),
                None => print_empty(&wanted),
            }
        }
        "again" => match book.show_again() {
            Some(record) => print_record(&record),
            None => println!("Nothing shown yet in this session."),
        },
        "add" => {
            let (category, text) = rest.split_once(' ').unwrap_or((rest, ""));
            if book.add_quote(text, category).is_ok() {
                println!("{}New quote added locally!", CHECK);
            }
        }
        "filter" => {
            *filter = book.apply_filter(rest);
            println!("{}Filter set to {}", CHECK, style(&*filter).bold());
        }
        "categories" => println!("{}", book.categories().join("\n")),
        "list" => {
            for record in book.list(filter) {
                println!("{}{} {}", ARROW, record.text, style(format!("[{}]", record.category)).dim());
            }
        }
        "sync" => {
            book.sync_now().await;
        }
        "import" => {
            let _ = book.import_file(Path::new(rest));
        }
        "export" => {
            let path = if rest.is_empty() { EXPORT_FILE_NAME } else { rest };
            if book.export_file(Path::new(path)).is_ok() {
                println!("{}Exported to {}", CHECK, path);
            }
        }
        "status" => match sink.board().current() {
            Some(notice) => println!("[{}] {}", notice.severity, notice.message),
            None => println!("(no status)"),
        },
        "stats" => {
            let stats = book.engine().stats();
            println!(
                "pulls: {} ok / {} failed / {} skipped, merged: {}, pushes: {} ok / {} failed",
                stats.successful_pulls,
                stats.failed_pulls,
                stats.skipped_pulls,
                stats.records_merged,
                stats.pushes_accepted,
                stats.pushes_failed
            );
            if let Some(last) = stats.last_sync {
                println!("last sync: {}", last.to_rfc3339());
            }
        }
        other => println!("{}Unknown command: {} (try \"help\")", CROSS, other),
    }
    true
}

pub async fn show_config(cli: &Cli, config: &Config, init: bool) -> Result<()> {
    if init {
        config.save(cli.config.as_deref())?;
        let path = cli.config.clone().unwrap_or_else(Config::default_path);
        println!("{}Wrote {}", CHECK, path.display());
        return Ok(());
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
