//! Error types for snapshot encryption and decoding.

use thiserror::Error;

/// Snapshot container and key errors.
///
/// `Decryption` deliberately carries no detail: the message must not leak
/// key material or partial plaintext, whether the cause was a wrong key, a
/// tampered file or a bad nonce.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Encryption failed.
    #[error("encryption failed")]
    Encryption,

    /// Decryption failed - wrong key, corrupted or tampered container.
    #[error("decryption failed")]
    Decryption,

    /// Container shorter than a nonce; not a valid snapshot.
    #[error("snapshot container is truncated")]
    Truncated,

    /// Container is not valid base64.
    #[error("snapshot container is not valid base64")]
    Encoding(#[from] base64::DecodeError),

    /// Persisted master key material is malformed.
    #[error("stored master key is invalid")]
    InvalidKey,

    /// Recovered plaintext is not a valid snapshot payload.
    #[error("invalid snapshot payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_error_is_generic() {
        let message = SnapshotError::Decryption.to_string();
        assert_eq!(message, "decryption failed");
    }
}
