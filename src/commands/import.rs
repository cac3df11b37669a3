//! Import command - restore the store from a snapshot

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use noteport::core::{AppPaths, Database};
use noteport::snapshot::{import_snapshot, KeyManager, SnapshotError};

pub fn run(paths: &AppPaths, file: &Path) -> Result<()> {
    let mut db = Database::open(&paths.db_file)?;
    let keys = KeyManager::new(&paths.secrets);

    match import_snapshot(&mut db, &keys, paths, file) {
        Ok(summary) => {
            db.append_audit(
                "snapshot.import",
                Some(serde_json::json!({ "notes": summary.notes })),
            )?;
            println!("{} Snapshot imported", "✓".green().bold());
            println!("  {} {} notes", "→".dimmed(), summary.notes);
            println!("  {} {} settings", "→".dimmed(), summary.settings);
            println!("  {} {} audit events", "→".dimmed(), summary.audit);
            println!("  {} {} attachment files", "→".dimmed(), summary.files);
            println!(
                "  {} embeddings may be stale; run {} to rebuild them",
                "→".dimmed(),
                "noteport reindex".cyan()
            );
            Ok(())
        }
        Err(err) => {
            // Wrong key, tampering and truncation all surface the same way;
            // nothing was changed.
            if matches!(
                err.downcast_ref::<SnapshotError>(),
                Some(SnapshotError::Decryption)
            ) {
                eprintln!("{} Decryption failed; store left unchanged", "✗".red().bold());
                std::process::exit(1);
            }
            Err(err)
        }
    }
}
