//! Remove command - soft-delete a note

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database};
use noteport::search::{DeterministicEmbedder, EmbeddingStore};

pub fn run(paths: &AppPaths, id: &str) -> Result<()> {
    let db = Database::open(&paths.db_file)?;

    if !db.soft_delete_note(id)? {
        eprintln!("{} Note not found: {}", "✗".red().bold(), id);
        std::process::exit(1);
    }

    let backend = DeterministicEmbedder;
    EmbeddingStore::new(&db, &backend).delete(id)?;

    println!("{} Deleted note {}", "✓".green().bold(), id.cyan());
    Ok(())
}
