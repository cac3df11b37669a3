//! Encrypted portable snapshots: master key management, AES-256-GCM
//! container codec, full-store export/import.

pub mod codec;
pub mod error;
pub mod keys;

pub use codec::{
    decode_container, encode_container, export_snapshot, import_snapshot, ImportSummary,
    SnapshotFile, SnapshotPayload, NONCE_LEN, SNAPSHOT_EXTENSION, TAG_LEN,
};
pub use error::{SnapshotError, SnapshotResult};
pub use keys::KeyManager;
