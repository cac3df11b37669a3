mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use noteport::AppPaths;

#[derive(Parser)]
#[command(name = "noteport")]
#[command(about = "Local-first notes with hybrid search and encrypted snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (default: $NOTEPORT_HOME, else ~/.noteport)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note and index it for search
    Add {
        text: String,
        #[arg(long = "tag", help = "Tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        pinned: bool,
        #[arg(long, help = "Skip embedding indexing")]
        no_index: bool,
    },
    /// Update a note's text, tags, category or pin state
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "tag", help = "Replace tags (repeatable)")]
        tags: Option<Vec<String>>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "unpin")]
        pin: bool,
        #[arg(long)]
        unpin: bool,
    },
    /// List notes, pinned first then most recently updated
    List {
        #[arg(long, help = "Pinned notes only")]
        pinned: bool,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Soft-delete a note and drop its embedding
    Remove { id: String },
    /// Hybrid search; empty query browses the filtered set
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long, help = "Pinned notes only")]
        pinned_only: bool,
        #[arg(long, help = "Exact category match")]
        category: Option<String>,
        #[arg(long, help = "Inclusive lower bound on updatedAt, epoch ms")]
        from: Option<i64>,
        #[arg(long, help = "Inclusive upper bound on updatedAt, epoch ms")]
        to: Option<i64>,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Recompute embeddings for every note
    Reindex {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Export an encrypted snapshot of the entire store
    Export {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Import a snapshot, replacing the entire store
    Import { file: PathBuf },
    /// Display the recovery key for the local master key
    #[command(name = "recovery-key")]
    RecoveryKey,
    /// Show store statistics
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(root) => AppPaths::from_root(root),
        None => AppPaths::new(),
    };
    paths.ensure_layout()?;

    match cli.command {
        Commands::Add {
            text,
            tags,
            category,
            pinned,
            no_index,
        } => commands::add::run(&paths, text, tags, category, pinned, no_index),
        Commands::Edit {
            id,
            text,
            tags,
            category,
            pin,
            unpin,
        } => commands::edit::run(&paths, &id, text, tags, category, pin, unpin),
        Commands::List {
            pinned,
            limit,
            json,
        } => commands::list::run(&paths, pinned, limit, json),
        Commands::Remove { id } => commands::remove::run(&paths, &id),
        Commands::Search {
            query,
            pinned_only,
            category,
            from,
            to,
            limit,
            json,
        } => commands::search::run(&paths, &query, pinned_only, category, from, to, limit, json),
        Commands::Reindex { json } => commands::reindex::run(&paths, json),
        Commands::Export { json } => commands::export::run(&paths, json),
        Commands::Import { file } => commands::import::run(&paths, &file),
        Commands::RecoveryKey => commands::recovery::run(&paths),
        Commands::Status { json } => commands::status::run(&paths, json),
    }
}
