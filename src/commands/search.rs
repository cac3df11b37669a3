//! Search command - hybrid lexical + semantic ranking

use anyhow::Result;
use colored::Colorize;

use noteport::core::{AppPaths, Database};
use noteport::search::{DeterministicEmbedder, SearchEngine, SearchFilters};

#[allow(clippy::too_many_arguments)]
pub fn run(
    paths: &AppPaths,
    query: &str,
    pinned_only: bool,
    category: Option<String>,
    from: Option<i64>,
    to: Option<i64>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let db = Database::open(&paths.db_file)?;
    let backend = DeterministicEmbedder;
    let engine = SearchEngine::new(&db, &backend);

    let filters = SearchFilters {
        pinned_only,
        category,
        from,
        to,
    };
    let limit = limit.unwrap_or(20);
    let hits = engine.search(query, &filters, limit)?;

    if json {
        let json_hits: Vec<_> = hits
            .iter()
            .map(|h| {
                serde_json::json!({
                    "id": h.note.id,
                    "text": h.note.text,
                    "tags": h.note.tags,
                    "category": h.note.category,
                    "pinned": h.note.pinned,
                    "updatedAt": h.note.updated_at,
                    "lexicalScore": h.lexical_score,
                    "semanticScore": h.semantic_score,
                    "combinedScore": h.combined_score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    if query.trim().is_empty() {
        println!("{} {} notes", "→".dimmed(), hits.len());
    } else {
        println!(
            "{} {} results for: {}",
            "→".dimmed(),
            hits.len(),
            query.cyan()
        );
    }
    println!();

    for (i, hit) in hits.iter().enumerate() {
        let score_str = format!("{:.3}", hit.combined_score);
        let score_colored = if hit.combined_score > 0.6 {
            score_str.green()
        } else if hit.combined_score > 0.3 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {} {}",
            (i + 1).to_string().bold(),
            score_colored,
            hit.note.id.cyan(),
            preview(&hit.note.text)
        );
        if !query.trim().is_empty() {
            println!(
                "   {}",
                format!(
                    "lexical {:.3} | semantic {:.3}",
                    hit.lexical_score, hit.semantic_score
                )
                .dimmed()
            );
        }
    }

    Ok(())
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > 70 {
        format!("{}...", first_line.chars().take(70).collect::<String>())
    } else {
        first_line.to_string()
    }
}
