//! Embedding store: one vector per note, kept in the `embeddings` table.
//!
//! Vectors are stored as little-endian f32 BLOBs. Absence of a vector is a
//! valid state — search degrades to a zero semantic score, it never fails.

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::note::now_ms;
use crate::core::Database;

use super::embedding::EmbeddingBackend;

/// Result of a reindex run. `completed < total` only when cancelled; every
/// row written before cancellation is complete and usable.
#[derive(Debug)]
pub struct ReindexOutcome {
    pub completed: usize,
    pub total: usize,
    pub cancelled: bool,
}

pub struct EmbeddingStore<'a> {
    db: &'a Database,
    backend: &'a dyn EmbeddingBackend,
}

impl<'a> EmbeddingStore<'a> {
    pub fn new(db: &'a Database, backend: &'a dyn EmbeddingBackend) -> Self {
        Self { db, backend }
    }

    /// Compute the embedding for `text` and replace any prior vector for the
    /// note. At most one vector per note id.
    pub fn upsert(&self, note_id: &str, text: &str) -> Result<()> {
        let vector = self.backend.embed(text);
        self.db.connection().execute(
            "INSERT OR REPLACE INTO embeddings(noteId, vector, updatedAt) VALUES(?1, ?2, ?3)",
            params![note_id, vector_to_blob(&vector), now_ms()],
        )?;
        Ok(())
    }

    /// Remove the vector for a note. Idempotent if absent.
    pub fn delete(&self, note_id: &str) -> Result<()> {
        self.db.connection().execute(
            "DELETE FROM embeddings WHERE noteId = ?1",
            params![note_id],
        )?;
        Ok(())
    }

    pub fn get(&self, note_id: &str) -> Result<Option<Vec<f32>>> {
        let blob: Option<Vec<u8>> = self
            .db
            .connection()
            .query_row(
                "SELECT vector FROM embeddings WHERE noteId = ?1",
                params![note_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(blob.map(|b| blob_to_vector(&b)))
    }

    /// Recompute embeddings for every non-deleted note, in storage order.
    ///
    /// Progress is reported at start, every 5th note, and at the end, so a
    /// caller can surface it without being flooded. The thread is yielded
    /// between notes to keep concurrent reads responsive, and `cancel` is
    /// checked per note: an abandoned run stops cleanly with partial
    /// coverage, which is a valid terminal state.
    pub fn reindex_all<F>(&self, cancel: &AtomicBool, mut progress: F) -> Result<ReindexOutcome>
    where
        F: FnMut(usize, usize),
    {
        let rows: Vec<(String, String)> = {
            let conn = self.db.connection();
            let mut stmt = conn
                .prepare("SELECT id, text FROM notes WHERE deletedAt IS NULL ORDER BY rowid")?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row?);
            }
            rows
        };

        let total = rows.len();
        progress(0, total);

        let mut completed = 0;
        let mut cancelled = false;
        for (i, (id, text)) in rows.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            self.upsert(id, text)?;
            completed = i + 1;
            if completed % 5 == 0 {
                progress(completed, total);
            }
            std::thread::yield_now();
        }

        progress(completed, total);
        Ok(ReindexOutcome {
            completed,
            total,
            cancelled,
        })
    }
}

/// Serialize an f32 vector as little-endian bytes.
fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for &value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Deserialize little-endian bytes back to an f32 vector.
fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}
