//! Codescope CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "codescope")]
#[command(about = "In-process code intelligence: symbol index, references, live change tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (TOML); defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the tree and print run statistics
    Index {
        /// Top-level files only, no recursion
        #[arg(long)]
        no_recursive: bool,
    },
    /// Index, then search symbols by name
    Search {
        query: String,

        /// Restrict to one kind: function, class, variable, import
        #[arg(short, long)]
        kind: Option<String>,

        /// Fall back to fuzzy subsequence matching
        #[arg(short, long)]
        fuzzy: bool,
    },
    /// Index, then find whole-token references to a symbol name
    Refs {
        name: String,

        /// Lines of surrounding context per reference
        #[arg(short, long)]
        context: Option<usize>,
    },
    /// Index, watch for changes, and keep the index current until Ctrl-C
    Watch,
    /// Changes observed by a watch within the look-back window
    Recent {
        /// Look-back window in hours
        #[arg(long, default_value = "24")]
        hours: u64,
    },
    /// Index and cache statistics
    Stats,
    /// Commits touching a file (git log)
    Log {
        path: String,

        /// Maximum commits to return
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Per-line authorship for a file (git blame)
    Blame { path: String },
    /// Added/removed counts against a revision (git diff --numstat)
    Diff { rev: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("codescope={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Codescope v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;
    let root = cli.root;

    match cli.command {
        Commands::Index { no_recursive } => commands::index(root, !no_recursive, config),
        Commands::Search { query, kind, fuzzy } => {
            commands::search(root, query, kind, fuzzy, config)
        }
        Commands::Refs { name, context } => commands::refs(root, name, context, config),
        Commands::Watch => commands::watch(root, config).await,
        Commands::Recent { hours } => commands::recent(root, hours, config).await,
        Commands::Stats => commands::stats(root, config),
        Commands::Log { path, limit } => commands::log(root, path, limit, config).await,
        Commands::Blame { path } => commands::blame(root, path, config).await,
        Commands::Diff { rev } => commands::diff(root, rev, config).await,
    }
}
