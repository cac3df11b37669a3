//! List command - browse notes

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database, ListOptions};

pub fn run(paths: &AppPaths, pinned: bool, limit: Option<usize>, json: bool) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let notes = db.list_notes(&ListOptions {
        pinned_only: pinned,
        limit,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("{} No notes yet", "→".dimmed());
        return Ok(());
    }

    println!("{} {} notes", "→".dimmed(), notes.len());
    println!();

    for note in &notes {
        let pin_marker = if note.pinned { "★".yellow() } else { " ".normal() };
        println!("{} {} {}", pin_marker, note.id.cyan(), preview(&note.text));
        if !note.tags.is_empty() {
            println!("    {}", note.tags.join(", ").dimmed());
        }
    }

    Ok(())
}

/// First line of the note, truncated char-aware for display.
fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > 80 {
        format!("{}...", first_line.chars().take(80).collect::<String>())
    } else {
        first_line.to_string()
    }
}
