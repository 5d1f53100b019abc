//! Core type definitions for VaultKV.

use crate::error::StoreError;
use std::fmt;

/// Lifecycle state of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    /// Constructed but never opened.
    Unopened,
    /// Loaded and accepting operations.
    Open,
    /// Drained and released; may be opened again.
    Closed,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A key or value handed back to callers.
///
/// The store keeps bytes; `Text` is only produced when the caller asks for
/// a non-buffer representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datum {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text (invalid sequences replaced).
    Text(String),
}

impl Datum {
    /// Wraps stored bytes in the requested representation.
    #[must_use]
    pub fn from_stored(bytes: Vec<u8>, as_buffer: bool) -> Self {
        if as_buffer {
            return Self::Bytes(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    /// Returns the datum as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// Converts the datum into bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }

    /// Returns true for [`Datum::Bytes`].
    #[must_use]
    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }
}

impl AsRef<[u8]> for Datum {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// One operation of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Set `key` to `value`; a `None` value is stored as empty.
    Put {
        /// Key to write.
        key: Vec<u8>,
        /// Value to store.
        value: Option<Vec<u8>>,
    },
    /// Remove `key` if present.
    Del {
        /// Key to remove.
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Creates a put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a delete operation.
    pub fn del(key: impl Into<Vec<u8>>) -> Self {
        Self::Del { key: key.into() }
    }

    /// Returns the key the operation targets.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Del { key } => key,
        }
    }
}

/// A batch operation whose type is still a string.
///
/// This is the shape batches arrive in from loosely typed callers; the
/// engine parses each one as it applies the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatchOp {
    /// Operation type, `"put"` or `"del"`.
    pub kind: String,
    /// Key to write or remove.
    pub key: Vec<u8>,
    /// Value for puts; ignored for deletes.
    pub value: Option<Vec<u8>>,
}

impl RawBatchOp {
    /// Creates a raw operation.
    pub fn new(kind: impl Into<String>, key: impl Into<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            value,
        }
    }
}

impl TryFrom<RawBatchOp> for BatchOp {
    type Error = StoreError;

    fn try_from(raw: RawBatchOp) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "put" => Ok(Self::Put {
                key: raw.key,
                value: raw.value,
            }),
            "del" => Ok(Self::Del { key: raw.key }),
            other => Err(StoreError::invalid_operation(format!("Invalid type {other}"))),
        }
    }
}

/// Counters describing the write serializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Physical writes that finished successfully.
    pub completed: u64,
    /// Physical writes that failed.
    pub failed: u64,
    /// Jobs queued or in flight.
    pub pending: usize,
}
