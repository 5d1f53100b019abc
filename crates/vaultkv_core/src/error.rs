//! Error types for VaultKV core.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Container error that is not a decode failure.
    #[error("storage error: {0}")]
    Storage(#[from] vaultkv_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not valid in the current lifecycle state.
    #[error("invalid state: {message}")]
    State {
        /// Description of the state violation.
        message: String,
    },

    /// Key or location does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// What was not found.
        message: String,
    },

    /// An open precondition was violated.
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description of the violated precondition.
        message: String,
    },

    /// Stored data could not be decrypted, decompressed or parsed.
    #[error("corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// A batch contained an unknown operation type.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of the invalid operation.
        message: String,
    },

    /// Encoding or writing the keyspace failed.
    #[error("write failed: {message}")]
    Write {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Returns true for [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`StoreError::Corruption`].
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}
