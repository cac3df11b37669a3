//! noteport library
//!
//! Local-first notes core: SQLite store, deterministic embedding pipeline,
//! hybrid lexical + vector search, and AES-256-GCM encrypted snapshots.
//!
//! # Modules
//!
//! - `core`: storage handle, domain types, data directory layout
//! - `search`: embedding backend, embedding store, hybrid query engine
//! - `snapshot`: master key, recovery key, encrypted export/import

pub mod core;
pub mod search;
pub mod snapshot;

// Re-exports for convenience
pub use self::core::{AppPaths, Database, ListOptions, NewNote, Note, NotePatch};
pub use self::search::{
    DeterministicEmbedder, EmbeddingBackend, EmbeddingStore, SearchEngine, SearchFilters,
    SearchHit,
};
pub use self::snapshot::{export_snapshot, import_snapshot, KeyManager, SnapshotError};
