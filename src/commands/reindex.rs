//! Reindex command - rebuild the embedding store

use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::sync::atomic::AtomicBool;

use noteport::core::{AppPaths, Database};
use noteport::search::{DeterministicEmbedder, EmbeddingStore};

pub fn run(paths: &AppPaths, json: bool) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let backend = DeterministicEmbedder;
    let store = EmbeddingStore::new(&db, &backend);

    // The CLI runs to completion; hosts embedding this library can flip the
    // flag to abandon a long reindex.
    let cancel = AtomicBool::new(false);

    let start = std::time::Instant::now();
    let outcome = store.reindex_all(&cancel, |done, total| {
        if !json {
            print!("\r{} Indexing {}/{}", "→".dimmed(), done, total);
            let _ = std::io::stdout().flush();
        }
    })?;
    let duration_ms = start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "completed": outcome.completed,
                "total": outcome.total,
                "cancelled": outcome.cancelled,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!();
        println!(
            "{} Reindexed {} notes in {:.2}s",
            "✓".green().bold(),
            outcome.completed.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
    }

    Ok(())
}
