//! SQLite store for notes, settings and the audit log.
//!
//! One explicitly constructed `Database` handle owns the connection; every
//! component that needs storage borrows it. `open_in_memory` gives each test
//! an isolated store.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::note::{fresh_id, now_ms, Attachment, AuditEvent, Note, Setting};

const SCHEMA_VERSION_KEY: &str = "schema_version";
const SCHEMA_VERSION: i64 = 2;

/// Input for creating a note. An id is generated when none is given.
#[derive(Debug, Default)]
pub struct NewNote {
    pub id: Option<String>,
    pub text: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub pinned: bool,
    pub attachments: Vec<Attachment>,
}

/// Partial update of a note. Absent fields keep their current value.
/// Any applied patch bumps `updatedAt`.
#[derive(Debug, Default)]
pub struct NotePatch {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<Option<String>>,
    pub pinned: Option<bool>,
    /// `Some(None)` clears the deletion marker, restoring the note.
    pub deleted_at: Option<Option<i64>>,
    pub attachments: Option<Vec<Attachment>>,
}

/// Options for listing notes (browse surface).
#[derive(Debug, Default)]
pub struct ListOptions {
    pub pinned_only: bool,
    pub limit: Option<usize>,
}

/// Store counters for the status command.
#[derive(Debug)]
pub struct StoreStats {
    pub active_notes: usize,
    pub deleted_notes: usize,
    pub pinned_notes: usize,
    pub embeddings: usize,
    pub audit_events: usize,
    pub last_audit_at: Option<i64>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        // journal_mode returns a row, so it cannot go through execute_batch.
        let _mode: String = self
            .conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                tags TEXT DEFAULT '[]',
                category TEXT,
                pinned INTEGER DEFAULT 0,
                createdAt INTEGER NOT NULL,
                updatedAt INTEGER NOT NULL,
                deletedAt INTEGER,
                attachments TEXT DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS audit (
                id TEXT PRIMARY KEY,
                at INTEGER NOT NULL,
                action TEXT NOT NULL,
                meta TEXT
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                noteId TEXT PRIMARY KEY,
                vector BLOB NOT NULL,
                updatedAt INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_updatedAt ON notes(updatedAt DESC);
            CREATE INDEX IF NOT EXISTS idx_notes_pinned ON notes(pinned);
            CREATE INDEX IF NOT EXISTS idx_notes_deletedAt ON notes(deletedAt);
            CREATE INDEX IF NOT EXISTS idx_embeddings_updatedAt ON embeddings(updatedAt DESC);
            "#,
        )?;

        // Record the schema version on first open.
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SCHEMA_VERSION_KEY],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_none() {
            self.conn.execute(
                "INSERT OR REPLACE INTO settings(key, value) VALUES(?1, ?2)",
                params![SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_string()],
            )?;
        }

        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ===== Notes =====

    /// Insert a new note and log `note.create`.
    pub fn create_note(&self, input: NewNote) -> Result<Note> {
        let now = now_ms();
        let note = Note {
            id: input.id.unwrap_or_else(fresh_id),
            text: input.text,
            tags: input.tags,
            category: input.category,
            pinned: input.pinned,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            attachments: input.attachments,
        };

        self.conn.execute(
            r#"
            INSERT INTO notes (id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)
            "#,
            params![
                note.id,
                note.text,
                serde_json::to_string(&note.tags)?,
                note.category,
                note.pinned as i64,
                note.created_at,
                note.updated_at,
                serde_json::to_string(&note.attachments)?,
            ],
        )?;

        self.append_audit(
            "note.create",
            Some(serde_json::json!({ "id": note.id, "pinned": note.pinned })),
        )?;

        Ok(note)
    }

    /// Apply a patch to an existing note and log `note.update`.
    /// Returns `None` when the note does not exist.
    pub fn update_note(&self, id: &str, patch: NotePatch) -> Result<Option<Note>> {
        let Some(existing) = self.get_note(id)? else {
            return Ok(None);
        };

        let updated = Note {
            id: existing.id,
            text: patch.text.unwrap_or(existing.text),
            tags: patch.tags.unwrap_or(existing.tags),
            category: patch.category.unwrap_or(existing.category),
            pinned: patch.pinned.unwrap_or(existing.pinned),
            created_at: existing.created_at,
            updated_at: now_ms(),
            deleted_at: patch.deleted_at.unwrap_or(existing.deleted_at),
            attachments: patch.attachments.unwrap_or(existing.attachments),
        };

        self.conn.execute(
            r#"
            UPDATE notes
            SET text = ?1, tags = ?2, category = ?3, pinned = ?4, updatedAt = ?5, deletedAt = ?6, attachments = ?7
            WHERE id = ?8
            "#,
            params![
                updated.text,
                serde_json::to_string(&updated.tags)?,
                updated.category,
                updated.pinned as i64,
                updated.updated_at,
                updated.deleted_at,
                serde_json::to_string(&updated.attachments)?,
                updated.id,
            ],
        )?;

        self.append_audit("note.update", Some(serde_json::json!({ "id": id })))?;

        Ok(Some(updated))
    }

    /// Soft-delete: sets `deletedAt`, keeps the row. Logs `note.delete`.
    /// Returns false when the note does not exist.
    pub fn soft_delete_note(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE notes SET deletedAt = ?1 WHERE id = ?2 AND deletedAt IS NULL",
            params![now_ms(), id],
        )?;
        if changed > 0 {
            self.append_audit("note.delete", Some(serde_json::json!({ "id": id })))?;
        }
        Ok(changed > 0)
    }

    pub fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                "SELECT id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments
                 FROM notes WHERE id = ?1",
                params![id],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    /// List non-deleted notes, pinned first, most recently updated first.
    pub fn list_notes(&self, opts: &ListOptions) -> Result<Vec<Note>> {
        let limit = opts.limit.unwrap_or(200);
        let mut sql = String::from(
            "SELECT id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments
             FROM notes WHERE deletedAt IS NULL",
        );
        if opts.pinned_only {
            sql.push_str(" AND pinned = 1");
        }
        sql.push_str(" ORDER BY pinned DESC, updatedAt DESC LIMIT ?1");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], row_to_note)?;
        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// Every note row, soft-deleted included, in storage order. Snapshot
    /// export uses this: a full backup must restore to an identical state.
    pub fn all_notes(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments
             FROM notes ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], row_to_note)?;
        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    // ===== Settings =====

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings(key, value) VALUES(?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn all_settings(&self) -> Result<Vec<Setting>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok(Setting {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        let mut settings = Vec::new();
        for row in rows {
            settings.push(row?);
        }
        Ok(settings)
    }

    // ===== Audit log =====

    /// Append an audit event with a fresh id and the current timestamp.
    pub fn append_audit(&self, action: &str, meta: Option<serde_json::Value>) -> Result<()> {
        let meta_json = match &meta {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO audit(id, at, action, meta) VALUES(?1, ?2, ?3, ?4)",
            params![fresh_id(), now_ms(), action, meta_json],
        )?;
        Ok(())
    }

    /// Most recent audit events, newest first.
    pub fn list_audit(&self, limit: usize) -> Result<Vec<AuditEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, at, action, meta FROM audit ORDER BY at DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], row_to_audit)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Every audit event in storage order, for snapshot export.
    pub fn all_audit(&self) -> Result<Vec<AuditEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, at, action, meta FROM audit ORDER BY rowid")?;
        let rows = stmt.query_map([], row_to_audit)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    // ===== Snapshot restore =====

    /// Replace the full contents of the notes, settings and audit tables in
    /// one transaction. Any failure rolls back, leaving prior data untouched.
    pub fn replace_all(
        &mut self,
        notes: &[Note],
        settings: &[Setting],
        audit: &[AuditEvent],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM notes", [])?;
        tx.execute("DELETE FROM settings", [])?;
        tx.execute("DELETE FROM audit", [])?;

        for note in notes {
            tx.execute(
                r#"
                INSERT INTO notes (id, text, tags, category, pinned, createdAt, updatedAt, deletedAt, attachments)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    note.id,
                    note.text,
                    serde_json::to_string(&note.tags)?,
                    note.category,
                    note.pinned as i64,
                    note.created_at,
                    note.updated_at,
                    note.deleted_at,
                    serde_json::to_string(&note.attachments)?,
                ],
            )?;
        }
        for setting in settings {
            tx.execute(
                "INSERT INTO settings(key, value) VALUES(?1, ?2)",
                params![setting.key, setting.value],
            )?;
        }
        for event in audit {
            let meta_json = match &event.meta {
                Some(value) => Some(serde_json::to_string(value)?),
                None => None,
            };
            tx.execute(
                "INSERT INTO audit(id, at, action, meta) VALUES(?1, ?2, ?3, ?4)",
                params![event.id, event.at, event.action, meta_json],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // ===== Stats =====

    pub fn stats(&self) -> Result<StoreStats> {
        let active_notes: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE deletedAt IS NULL",
            [],
            |row| row.get(0),
        )?;
        let deleted_notes: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE deletedAt IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        let pinned_notes: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE deletedAt IS NULL AND pinned = 1",
            [],
            |row| row.get(0),
        )?;
        let embeddings: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        let audit_events: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM audit", [], |row| row.get(0))?;
        let last_audit_at: Option<i64> = self
            .conn
            .query_row("SELECT MAX(at) FROM audit", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(StoreStats {
            active_notes: active_notes as usize,
            deleted_notes: deleted_notes as usize,
            pinned_notes: pinned_notes as usize,
            embeddings: embeddings as usize,
            audit_events: audit_events as usize,
            last_audit_at,
        })
    }
}

pub(crate) fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    let tags_json: String = row.get(2)?;
    let attachments_json: String = row.get(8)?;
    let pinned: i64 = row.get(4)?;
    Ok(Note {
        id: row.get(0)?,
        text: row.get(1)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        category: row.get(3)?,
        pinned: pinned != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted_at: row.get(7)?,
        attachments: serde_json::from_str(&attachments_json).unwrap_or_default(),
    })
}

fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEvent> {
    let meta_json: Option<String> = row.get(3)?;
    Ok(AuditEvent {
        id: row.get(0)?,
        at: row.get(1)?,
        action: row.get(2)?,
        meta: meta_json.and_then(|raw| serde_json::from_str(&raw).ok()),
    })
}
