//! Export command - write an encrypted snapshot

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database};
use noteport::snapshot::{export_snapshot, KeyManager};

pub fn run(paths: &AppPaths, json: bool) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let keys = KeyManager::new(&paths.secrets);

    let snapshot_path = export_snapshot(&db, &keys, paths)?;
    db.append_audit(
        "snapshot.export",
        Some(serde_json::json!({
            "file": snapshot_path.file_name().and_then(|n| n.to_str())
        })),
    )?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": snapshot_path.display().to_string() })
        );
    } else {
        println!("{} Snapshot exported", "✓".green().bold());
        println!("  {} {}", "→".dimmed(), snapshot_path.display());
        println!(
            "  {} keep your recovery key safe; without it this file cannot be decrypted",
            "!".yellow()
        );
    }

    Ok(())
}
