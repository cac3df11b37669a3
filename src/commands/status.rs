//! Status command - store statistics

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database};

pub fn run(paths: &AppPaths, json: bool) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let stats = db.stats()?;

    let db_size = std::fs::metadata(&paths.db_file).map(|m| m.len()).unwrap_or(0);
    let snapshot_count = std::fs::read_dir(&paths.snapshots)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map(|ext| ext == "onsnap")
                        .unwrap_or(false)
                })
                .count()
        })
        .unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "active_notes": stats.active_notes,
                "deleted_notes": stats.deleted_notes,
                "pinned_notes": stats.pinned_notes,
                "embeddings": stats.embeddings,
                "audit_events": stats.audit_events,
                "last_audit_at": stats.last_audit_at,
                "db_size_bytes": db_size,
                "snapshots": snapshot_count,
            })
        );
        return Ok(());
    }

    println!("{}", "Store Status".bold());
    println!();
    println!(
        "  {} {} active notes ({} pinned)",
        "→".dimmed(),
        stats.active_notes.to_string().cyan(),
        stats.pinned_notes
    );
    println!("  {} {} soft-deleted notes", "→".dimmed(), stats.deleted_notes);
    println!(
        "  {} {} embeddings indexed",
        "→".dimmed(),
        stats.embeddings.to_string().cyan()
    );
    println!("  {} {} audit events", "→".dimmed(), stats.audit_events);
    println!("  {} {} snapshots on disk", "→".dimmed(), snapshot_count);
    println!("  {} Size: {:.2} KB", "→".dimmed(), db_size as f64 / 1024.0);
    if let Some(at) = stats.last_audit_at {
        let dt = chrono::DateTime::from_timestamp_millis(at)
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        println!("  {} Last activity: {}", "→".dimmed(), dt);
    }

    if stats.embeddings < stats.active_notes {
        println!();
        println!(
            "{} {} notes lack embeddings; run {} to index them",
            "!".yellow(),
            stats.active_notes - stats.embeddings,
            "noteport reindex".cyan()
        );
    }

    Ok(())
}
