//! Error types for container operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for container operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing a container.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The container bytes are not a valid container.
    #[error("container corrupted: {0}")]
    Corrupted(String),

    /// Encryption or decryption failed.
    ///
    /// Authentication failures (wrong passphrase, tampered bytes) land here.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Another handle holds the advisory lock on the container.
    #[error("container is locked by another handle: {}", path.display())]
    Locked {
        /// Path of the lock file that could not be acquired.
        path: PathBuf,
    },

    /// The container was used after `destroy()`.
    #[error("container has been destroyed")]
    Destroyed,

    /// A failure injected by a test provider.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl StorageError {
    /// Returns true if the error means the stored bytes could not be decoded.
    ///
    /// Callers use this to tell corrupt data apart from plain I/O trouble.
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Corrupted(_) | Self::Encryption(_))
    }
}
