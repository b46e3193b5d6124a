//! Snapshot error types.

use crate::core::IntegrityError;
use thiserror::Error;

/// Errors that can occur while saving or restoring a deal snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot was written by an unknown format version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Restored deal breaks a history invariant
    #[error("Snapshot integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),
}
