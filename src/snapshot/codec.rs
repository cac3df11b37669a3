//! Encrypted snapshot container: full export and all-or-nothing import.
//!
//! A snapshot is `base64(nonce ‖ AES-256-GCM ciphertext+tag)` over a JSON
//! payload of every note row (soft-deleted included), all settings, the
//! audit log and the attachment files. A fresh nonce is drawn for every
//! export, so ciphertexts differ even for unchanged data while re-imports
//! converge to the same logical state.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{SecondsFormat, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::note::now_ms;
use crate::core::{AppPaths, AuditEvent, Database, Note, Setting};

use super::error::{SnapshotError, SnapshotResult};
use super::keys::KeyManager;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Snapshot file extension.
pub const SNAPSHOT_EXTENSION: &str = "onsnap";

/// One attachment bundled into a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub name: String,
    pub size: u64,
    pub base64: String,
}

/// The plaintext document sealed inside a container.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub notes: Vec<Note>,
    pub settings: Vec<Setting>,
    pub audit: Vec<AuditEvent>,
    pub files: Vec<SnapshotFile>,
    /// Export timestamp, epoch ms.
    pub ts: i64,
}

/// Counters reported after a successful import.
#[derive(Debug)]
pub struct ImportSummary {
    pub notes: usize,
    pub settings: usize,
    pub audit: usize,
    pub files: usize,
}

/// Encrypt with AES-256-GCM; the returned ciphertext carries the appended
/// 16-byte authentication tag.
fn aes_gcm_encrypt(key: &[u8; 32], nonce: &[u8; 12], plaintext: &[u8]) -> SnapshotResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SnapshotError::Encryption)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| SnapshotError::Encryption)
}

/// Decrypt and authenticate. Any failure maps to the generic decryption
/// error so nothing about the cause or contents leaks.
fn aes_gcm_decrypt(key: &[u8; 32], nonce: &[u8; 12], ciphertext: &[u8]) -> SnapshotResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SnapshotError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SnapshotError::Decryption)
}

/// Seal a payload into a base64 container under a fresh random nonce.
pub fn encode_container(key: &[u8; 32], payload: &SnapshotPayload) -> SnapshotResult<String> {
    let plaintext = serde_json::to_vec(payload)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = aes_gcm_encrypt(key, &nonce, &plaintext)?;
    let mut container = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    container.extend_from_slice(&nonce);
    container.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(container))
}

/// Open a base64 container and parse the payload. Fails loudly on
/// truncation, bad encoding or any authentication mismatch.
pub fn decode_container(key: &[u8; 32], encoded: &str) -> SnapshotResult<SnapshotPayload> {
    let bytes = BASE64.decode(encoded.trim())?;
    if bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(SnapshotError::Truncated);
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| SnapshotError::Truncated)?;
    let plaintext = aes_gcm_decrypt(key, &nonce, ciphertext)?;

    Ok(serde_json::from_slice(&plaintext)?)
}

/// Export the entire store into an encrypted container file under the
/// snapshots directory. Returns the written path.
pub fn export_snapshot(db: &Database, keys: &KeyManager, paths: &AppPaths) -> Result<PathBuf> {
    let payload = SnapshotPayload {
        notes: db.all_notes()?,
        settings: db.all_settings()?,
        audit: db.all_audit()?,
        files: collect_attachment_files(&paths.attachments)?,
        ts: now_ms(),
    };

    let key = keys.ensure_master_key()?;
    let container = encode_container(&key, &payload)?;

    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    std::fs::create_dir_all(&paths.snapshots)?;
    let out_path = paths
        .snapshots
        .join(format!("snapshot-{}.{}", stamp, SNAPSHOT_EXTENSION));
    std::fs::write(&out_path, container)
        .with_context(|| format!("Failed to write snapshot to {}", out_path.display()))?;

    Ok(out_path)
}

/// Import a snapshot file, replacing the full store contents.
///
/// Authentication and payload decoding happen before any mutation; the
/// table swap runs in a single transaction; attachment bytes are decoded
/// up front so a malformed file entry also aborts with zero state change.
pub fn import_snapshot(
    db: &mut Database,
    keys: &KeyManager,
    paths: &AppPaths,
    file: &Path,
) -> Result<ImportSummary> {
    let encoded = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read snapshot file {}", file.display()))?;

    let key = keys.ensure_master_key()?;
    let payload = decode_container(&key, &encoded)?;

    let mut restored_files: Vec<(String, Vec<u8>)> = Vec::with_capacity(payload.files.len());
    for entry in &payload.files {
        // Only the base name is honored; path components are stripped.
        let name = Path::new(&entry.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let bytes = BASE64
            .decode(&entry.base64)
            .map_err(SnapshotError::Encoding)?;
        restored_files.push((name, bytes));
    }

    db.replace_all(&payload.notes, &payload.settings, &payload.audit)?;

    std::fs::create_dir_all(&paths.attachments)?;
    for (name, bytes) in &restored_files {
        std::fs::write(paths.attachments.join(name), bytes)?;
    }

    Ok(ImportSummary {
        notes: payload.notes.len(),
        settings: payload.settings.len(),
        audit: payload.audit.len(),
        files: restored_files.len(),
    })
}

/// Read every regular file in the attachments directory into the snapshot.
/// A missing directory simply yields no files.
fn collect_attachment_files(dir: &Path) -> Result<Vec<SnapshotFile>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(files),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let bytes = std::fs::read(&path)?;
        files.push(SnapshotFile {
            name,
            size: bytes.len() as u64,
            base64: BASE64.encode(bytes),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
