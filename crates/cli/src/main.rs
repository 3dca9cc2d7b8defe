//! Autosort CLI - abs command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cmd;
mod util;

/// Autosort - keep bookmark folders in order as they change
#[derive(Parser)]
#[command(name = "abs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Preference file (default: <config dir>/autosort/prefs.toml)
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View or edit options
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run first-run handling and legacy option migration
    Migrate {
        /// Treat this as a fresh install (skips migration)
        #[arg(long)]
        install: bool,
    },
    /// Sort a bookmark file once with the current options
    Sort {
        /// Bookmark tree (JSON)
        #[arg(long)]
        tree: PathBuf,
    },
    /// Apply a mutation script with automatic sorting on
    Replay {
        /// Bookmark tree (JSON)
        #[arg(long)]
        tree: PathBuf,
        /// Operations, one JSON object per line
        #[arg(long)]
        ops: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List every option with its current value
    List,
    /// Print one option
    Get {
        /// Option name, short or full
        key: String,
    },
    /// Change one option
    Set {
        /// Option name, short or full
        key: String,
        /// New value
        value: String,
    },
    /// Return one option to its default
    Reset {
        /// Option name, short or full
        key: String,
    },
    /// Print the preference file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    let prefs_path = match cli.prefs {
        Some(path) => path,
        None => util::default_prefs_path()?,
    };

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::List => cmd::config::run_list(&prefs_path).await,
            ConfigAction::Get { key } => cmd::config::run_get(&prefs_path, &key).await,
            ConfigAction::Set { key, value } => {
                cmd::config::run_set(&prefs_path, &key, &value).await
            }
            ConfigAction::Reset { key } => cmd::config::run_reset(&prefs_path, &key).await,
            ConfigAction::Path => cmd::config::run_path(&prefs_path).await,
        },
        Commands::Migrate { install } => cmd::migrate::run(&prefs_path, install).await,
        Commands::Sort { tree } => cmd::sort::run(&prefs_path, &tree).await,
        Commands::Replay { tree, ops } => cmd::replay::run(&prefs_path, &tree, &ops).await,
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default `warn` level. With a log file the returned
/// guard must live until exit so buffered lines are flushed.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}
