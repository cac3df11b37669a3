//! Core storage: data directory layout, domain types, SQLite store.

pub mod db;
pub mod note;
pub mod paths;

pub use db::{Database, ListOptions, NewNote, NotePatch, StoreStats};
pub use note::{Attachment, AuditEvent, Note, Setting};
pub use paths::AppPaths;
