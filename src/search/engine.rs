//! Hybrid query engine: lexical term-frequency scoring blended with vector
//! similarity over the embedding store.
//!
//! Filtering happens in SQL (cheap, indexed); scoring happens in Rust over a
//! bounded candidate set. Scoring never fails: missing signals contribute 0.

use anyhow::Result;
use rusqlite::types::Value;
use std::collections::HashMap;

use crate::core::db::row_to_note;
use crate::core::{Database, Note};

use super::embedding::{cosine_similarity, EmbeddingBackend};
use super::store::EmbeddingStore;

/// Candidates are capped to the most recently updated matches before scoring.
pub const CANDIDATE_CAP: usize = 500;

const LEXICAL_WEIGHT: f32 = 0.6;
const SEMANTIC_WEIGHT: f32 = 0.4;

/// Structured search filters. All fields optional; the zero value filters
/// nothing beyond the always-on soft-deletion exclusion.
#[derive(Debug, Default, Clone)]
pub struct SearchFilters {
    pub pinned_only: bool,
    pub category: Option<String>,
    /// Inclusive lower bound on `updatedAt`, epoch ms.
    pub from: Option<i64>,
    /// Inclusive upper bound on `updatedAt`, epoch ms.
    pub to: Option<i64>,
}

impl SearchFilters {
    /// Blank or whitespace-only category means "no filter".
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A ranked note with its score breakdown, for observability.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub note: Note,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub combined_score: f32,
}

pub struct SearchEngine<'a> {
    db: &'a Database,
    backend: &'a dyn EmbeddingBackend,
}

impl<'a> SearchEngine<'a> {
    pub fn new(db: &'a Database, backend: &'a dyn EmbeddingBackend) -> Self {
        Self { db, backend }
    }

    /// Rank notes for `query` under `filters`, truncated to `limit`.
    ///
    /// An empty query is browse mode: the filtered set ordered pinned-first
    /// then by recency, with no embedding lookups and all scores zero.
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return self.browse(filters, limit);
        }

        let candidates = self.candidates(query, filters)?;
        let query_tokens = tokenize(query);
        let query_vector = self.backend.embed(query);
        let embeddings = EmbeddingStore::new(self.db, self.backend);

        let mut hits: Vec<SearchHit> = Vec::with_capacity(candidates.len());
        for note in candidates {
            let haystack = format!(
                "{}\n{}\n{}",
                note.text,
                note.tags.join(" "),
                note.category.as_deref().unwrap_or("")
            );
            let lexical = lexical_score(&query_tokens, &haystack);
            let semantic = match embeddings.get(&note.id)? {
                Some(vector) => cosine_similarity(&query_vector, &vector),
                None => 0.0,
            };
            let combined = LEXICAL_WEIGHT * lexical + SEMANTIC_WEIGHT * semantic.max(0.0);
            hits.push(SearchHit {
                note,
                lexical_score: lexical,
                semantic_score: semantic,
                combined_score: combined,
            });
        }

        // Stable sort keeps candidate order (recency) for equal scores.
        hits.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Candidate pre-filter in SQL: soft-deletion, structured filters, and a
    /// coarse case-insensitive substring match over text, tags and category.
    fn candidates(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Note>> {
        let mut sql = String::from(
            "SELECT id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments
             FROM notes WHERE deletedAt IS NULL",
        );
        let mut params: Vec<Value> = Vec::new();

        if filters.pinned_only {
            sql.push_str(" AND pinned = 1");
        }
        if let Some(category) = filters.category() {
            params.push(Value::Text(category.to_string()));
            sql.push_str(&format!(" AND category = ?{}", params.len()));
        }
        if let Some(from) = filters.from {
            params.push(Value::Integer(from));
            sql.push_str(&format!(" AND updatedAt >= ?{}", params.len()));
        }
        if let Some(to) = filters.to {
            params.push(Value::Integer(to));
            sql.push_str(&format!(" AND updatedAt <= ?{}", params.len()));
        }

        // `%` and `_` are LIKE wildcards; strip both so the query is matched
        // as a literal substring.
        let like = format!("%{}%", query.replace(['%', '_'], ""));
        params.push(Value::Text(like.clone()));
        let text_idx = params.len();
        params.push(Value::Text(like.clone()));
        let tags_idx = params.len();
        params.push(Value::Text(like));
        let category_idx = params.len();
        sql.push_str(&format!(
            " AND (text LIKE ?{} OR tags LIKE ?{} OR category LIKE ?{})",
            text_idx, tags_idx, category_idx
        ));

        sql.push_str(&format!(
            " ORDER BY updatedAt DESC LIMIT {}",
            CANDIDATE_CAP
        ));

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_note)?;
        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// Browse mode: pinned notes first, then most recently updated.
    fn browse(&self, filters: &SearchFilters, limit: usize) -> Result<Vec<SearchHit>> {
        let mut sql = String::from(
            "SELECT id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments
             FROM notes WHERE deletedAt IS NULL",
        );
        let mut params: Vec<Value> = Vec::new();

        if filters.pinned_only {
            sql.push_str(" AND pinned = 1");
        }
        if let Some(category) = filters.category() {
            params.push(Value::Text(category.to_string()));
            sql.push_str(&format!(" AND category = ?{}", params.len()));
        }
        if let Some(from) = filters.from {
            params.push(Value::Integer(from));
            sql.push_str(&format!(" AND updatedAt >= ?{}", params.len()));
        }
        if let Some(to) = filters.to {
            params.push(Value::Integer(to));
            sql.push_str(&format!(" AND updatedAt <= ?{}", params.len()));
        }

        sql.push_str(&format!(
            " ORDER BY pinned DESC, updatedAt DESC LIMIT {}",
            limit
        ));

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_note)?;
        let mut hits = Vec::new();
        for row in rows {
            hits.push(SearchHit {
                note: row?,
                lexical_score: 0.0,
                semantic_score: 0.0,
                combined_score: 0.0,
            });
        }
        Ok(hits)
    }
}

/// Lowercase alphanumeric tokens; non-alphanumeric runs separate tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Term-frequency score, length-normalized so long notes are not favored:
/// sum of query-token frequencies divided by sqrt(candidate token count + 1).
fn lexical_score(query_tokens: &[String], haystack: &str) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let tokens = tokenize(haystack);
    let mut freq: HashMap<&str, u32> = HashMap::new();
    for token in &tokens {
        *freq.entry(token.as_str()).or_insert(0) += 1;
    }
    let matched: u32 = query_tokens
        .iter()
        .map(|q| freq.get(q.as_str()).copied().unwrap_or(0))
        .sum();
    matched as f32 / ((tokens.len() + 1) as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Database, NewNote};
    use crate::search::embedding::DeterministicEmbedder;
    use std::sync::atomic::AtomicBool;

    fn seed_note(db: &Database, id: &str, text: &str, tags: &[&str]) {
        db.create_note(NewNote {
            id: Some(id.to_string()),
            text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        })
        .unwrap();
    }

    fn indexed_db(notes: &[(&str, &str, &[&str])]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for (id, text, tags) in notes {
            seed_note(&db, id, text, tags);
        }
        let backend = DeterministicEmbedder;
        let store = EmbeddingStore::new(&db, &backend);
        store.reindex_all(&AtomicBool::new(false), |_, _| {}).unwrap();
        db
    }

    #[test]
    fn test_tokenize_alphanumeric_runs() {
        assert_eq!(
            tokenize("Kaufliste: Milch, Brot!"),
            vec!["kaufliste", "milch", "brot"]
        );
        assert_eq!(tokenize("  ...  "), Vec::<String>::new());
    }

    #[test]
    fn test_lexical_score_monotone_in_occurrences() {
        let query = tokenize("apple");
        // Same token count, more query-token occurrences.
        let once = lexical_score(&query, "apple pear plum cherry");
        let twice = lexical_score(&query, "apple apple plum cherry");
        assert!(twice > once);
        assert!(once > 0.0);
        assert_eq!(lexical_score(&[], "apple"), 0.0);
    }

    #[test]
    fn test_ranking_scenario() -> Result<()> {
        let db = indexed_db(&[
            ("n1", "Schraubenzieher ist in der Schublade", &["werkzeug"]),
            ("n2", "Kaufliste: Milch, Brot", &[]),
        ]);
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let hits = engine.search("Schraubenzieher", &SearchFilters::default(), 50)?;
        // n2 has no substring match, so only n1 survives the candidate filter.
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note.id, "n1");
        assert!(hits[0].lexical_score > 0.0);
        assert!(hits[0].combined_score > 0.0);
        Ok(())
    }

    #[test]
    fn test_ranking_orders_by_combined_score() -> Result<()> {
        let db = indexed_db(&[
            ("weak", "milch und viele andere worte ohne jeden bezug", &[]),
            ("strong", "milch milch milch", &[]),
        ]);
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let hits = engine.search("milch", &SearchFilters::default(), 10)?;
        assert_eq!(hits.len(), 2);
        // Lexical dominance: three occurrences over three tokens beats one
        // occurrence over seven, no matter what the semantic term adds.
        assert_eq!(hits[0].note.id, "strong");
        assert!(hits[0].combined_score > hits[1].combined_score);
        Ok(())
    }

    #[test]
    fn test_like_wildcards_are_not_wildcards() -> Result<()> {
        let db = Database::open_in_memory()?;
        seed_note(&db, "n1", "abc", &[]);
        seed_note(&db, "n2", "tacky", &[]);
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        // "_" must not act as a single-character wildcard admitting "abc";
        // the stripped pattern is the literal substring "ac".
        let hits = engine.search("a_c", &SearchFilters::default(), 10)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note.id, "n2");

        // Same for "%": no match-anything expansion past the substring.
        let hits = engine.search("a%c", &SearchFilters::default(), 10)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note.id, "n2");
        Ok(())
    }

    #[test]
    fn test_candidate_cap_keeps_most_recent() -> Result<()> {
        let db = Database::open_in_memory()?;
        let total = CANDIDATE_CAP + 20;
        for i in 0..total {
            seed_note(&db, &format!("n{}", i), "capped text", &[]);
            db.connection().execute(
                "UPDATE notes SET updatedAt = ?1 WHERE id = ?2",
                rusqlite::params![i as i64, format!("n{}", i)],
            )?;
        }
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let hits = engine.search("capped", &SearchFilters::default(), total)?;
        assert_eq!(hits.len(), CANDIDATE_CAP);
        // The oldest notes fall outside the recency-ordered candidate window.
        assert!(hits.iter().all(|h| h.note.updated_at >= 20));
        Ok(())
    }

    #[test]
    fn test_tag_and_category_match_candidates() -> Result<()> {
        let db = indexed_db(&[("n1", "nothing relevant", &["werkzeug"])]);
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let hits = engine.search("werkzeug", &SearchFilters::default(), 10)?;
        assert_eq!(hits.len(), 1);
        assert!(hits[0].lexical_score > 0.0); // tag tokens count
        Ok(())
    }

    #[test]
    fn test_missing_embedding_scores_zero_semantic() -> Result<()> {
        let db = Database::open_in_memory()?;
        seed_note(&db, "n1", "coffee beans", &[]);
        // No embedding indexed for n1.
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let hits = engine.search("coffee", &SearchFilters::default(), 10)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].semantic_score, 0.0);
        assert!(hits[0].lexical_score > 0.0);
        assert!(
            (hits[0].combined_score - 0.6 * hits[0].lexical_score).abs() < 1e-6
        );
        Ok(())
    }

    #[test]
    fn test_browse_mode_orders_pinned_then_recency() -> Result<()> {
        // No embeddings at all: browse must not need them.
        let db = Database::open_in_memory()?;
        seed_note(&db, "old", "old note", &[]);
        seed_note(&db, "new", "new note", &[]);
        db.create_note(NewNote {
            id: Some("pinned".into()),
            text: "pinned note".into(),
            pinned: true,
            ..Default::default()
        })?;
        db.connection()
            .execute("UPDATE notes SET updatedAt = updatedAt + 10 WHERE id = 'new'", [])?;

        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);
        let hits = engine.search("", &SearchFilters::default(), 10)?;

        let ids: Vec<&str> = hits.iter().map(|h| h.note.id.as_str()).collect();
        assert_eq!(ids, vec!["pinned", "new", "old"]);
        assert!(hits.iter().all(|h| h.combined_score == 0.0));
        Ok(())
    }

    #[test]
    fn test_filters_category_and_pinned() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.create_note(NewNote {
            id: Some("a".into()),
            text: "note in work".into(),
            category: Some("work".into()),
            ..Default::default()
        })?;
        db.create_note(NewNote {
            id: Some("b".into()),
            text: "note in home".into(),
            category: Some("home".into()),
            pinned: true,
            ..Default::default()
        })?;

        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let work = engine.search(
            "note",
            &SearchFilters {
                category: Some("work".into()),
                ..Default::default()
            },
            10,
        )?;
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].note.id, "a");

        let pinned = engine.search(
            "note",
            &SearchFilters {
                pinned_only: true,
                ..Default::default()
            },
            10,
        )?;
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0].note.id, "b");

        // Blank category normalizes to "no filter".
        let blank = engine.search(
            "note",
            &SearchFilters {
                category: Some("   ".into()),
                ..Default::default()
            },
            10,
        )?;
        assert_eq!(blank.len(), 2);
        Ok(())
    }

    #[test]
    fn test_time_range_inclusive() -> Result<()> {
        let db = Database::open_in_memory()?;
        seed_note(&db, "n1", "stamped note", &[]);
        db.connection()
            .execute("UPDATE notes SET updatedAt = 1000 WHERE id = 'n1'", [])?;

        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);

        let exact = SearchFilters {
            from: Some(1000),
            to: Some(1000),
            ..Default::default()
        };
        assert_eq!(engine.search("stamped", &exact, 10)?.len(), 1);

        let outside = SearchFilters {
            from: Some(1001),
            ..Default::default()
        };
        assert!(engine.search("stamped", &outside, 10)?.is_empty());

        // Inverted range matches nothing rather than erroring.
        let inverted = SearchFilters {
            from: Some(2000),
            to: Some(1000),
            ..Default::default()
        };
        assert!(engine.search("stamped", &inverted, 10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_limit_truncates() -> Result<()> {
        let db = Database::open_in_memory()?;
        for i in 0..5 {
            seed_note(&db, &format!("n{}", i), "repeated text", &[]);
        }
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);
        assert_eq!(engine.search("repeated", &SearchFilters::default(), 2)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_deleted_notes_never_surface() -> Result<()> {
        let db = indexed_db(&[("n1", "ghost note", &[])]);
        db.soft_delete_note("n1")?;
        let backend = DeterministicEmbedder;
        let engine = SearchEngine::new(&db, &backend);
        assert!(engine.search("ghost", &SearchFilters::default(), 10)?.is_empty());
        assert!(engine.search("", &SearchFilters::default(), 10)?.is_empty());
        Ok(())
    }
}
