//! Edit command - patch an existing note

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database, NotePatch};
use noteport::search::{DeterministicEmbedder, EmbeddingStore};

#[allow(clippy::too_many_arguments)]
pub fn run(
    paths: &AppPaths,
    id: &str,
    text: Option<String>,
    tags: Option<Vec<String>>,
    category: Option<String>,
    pin: bool,
    unpin: bool,
) -> Result<()> {
    let db = Database::open(&paths.db_file)?;

    let text_changed = text.is_some();
    let patch = NotePatch {
        text,
        tags,
        category: category.map(Some),
        pinned: if pin {
            Some(true)
        } else if unpin {
            Some(false)
        } else {
            None
        },
        deleted_at: None,
        attachments: None,
    };

    match db.update_note(id, patch)? {
        Some(note) => {
            // Text changed: the stored vector is stale, replace it.
            if text_changed {
                let backend = DeterministicEmbedder;
                EmbeddingStore::new(&db, &backend).upsert(&note.id, &note.text)?;
            }
            println!("{} Updated note {}", "✓".green().bold(), note.id.cyan());
            Ok(())
        }
        None => {
            eprintln!("{} Note not found: {}", "✗".red().bold(), id);
            std::process::exit(1);
        }
    }
}
