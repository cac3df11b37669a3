//! Domain types shared by the store, the search engine and the snapshot codec.
//!
//! Wire names (serde) are camelCase so snapshot payloads stay compatible with
//! the columns and the historical export format.

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Reference to a file attached to a note. The bytes themselves live in the
/// attachments directory; only metadata is stored on the note row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// A note row. `deleted_at` marks soft deletion: the row persists but is
/// excluded from listing, search and restore-visible operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub deleted_at: Option<i64>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Note {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// One entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub at: i64,
    pub action: String,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

/// A settings row: string key to string value, last-write-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Fresh opaque identifier for notes and audit events.
pub fn fresh_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_id_shape() {
        let a = fresh_id();
        let b = fresh_id();
        assert_eq!(a.len(), 24);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_note_wire_names() {
        let note = Note {
            id: "n1".into(),
            text: "hello".into(),
            tags: vec!["t".into()],
            category: None,
            pinned: true,
            created_at: 1,
            updated_at: 2,
            deleted_at: None,
            attachments: vec![],
        };
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("deletedAt").is_some());

        let back: Note = serde_json::from_value(json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_note_defaults_on_sparse_payload() {
        let back: Note = serde_json::from_str(
            r#"{"id":"n1","text":"x","createdAt":1,"updatedAt":1}"#,
        )
        .unwrap();
        assert!(back.tags.is_empty());
        assert!(!back.pinned);
        assert!(back.attachments.is_empty());
        assert!(!back.is_deleted());
    }
}
