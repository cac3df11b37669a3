//! Add command - create a note and index it

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database, NewNote};
use noteport::search::{DeterministicEmbedder, EmbeddingStore};

pub fn run(
    paths: &AppPaths,
    text: String,
    tags: Vec<String>,
    category: Option<String>,
    pinned: bool,
    no_index: bool,
) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let note = db.create_note(NewNote {
        id: None,
        text,
        tags,
        category,
        pinned,
        attachments: vec![],
    })?;

    if !no_index {
        let backend = DeterministicEmbedder;
        EmbeddingStore::new(&db, &backend).upsert(&note.id, &note.text)?;
    }

    println!("{} Created note {}", "✓".green().bold(), note.id.cyan());
    if note.pinned {
        println!("  {} pinned", "→".dimmed());
    }
    if no_index {
        println!(
            "  {} not indexed; run {} to include it in semantic ranking",
            "→".dimmed(),
            "noteport reindex".cyan()
        );
    }

    Ok(())
}
