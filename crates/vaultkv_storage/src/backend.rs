//! Container backend and provider traits.

use crate::error::StorageResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cleartext metadata stored at the front of a container.
///
/// The header is not encrypted but it is authenticated: changing it on disk
/// makes the payload fail to decrypt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Name of the application that owns the container.
    #[serde(rename = "appName")]
    pub app_name: String,
    /// Version of the application that last wrote the container.
    #[serde(rename = "appVersion")]
    pub app_version: String,
}

impl ContainerHeader {
    /// Creates a header for the given application.
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
        }
    }

    /// Returns true if no application metadata is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.app_name.is_empty() && self.app_version.is_empty()
    }
}

/// A single encrypted blob bound to one location.
///
/// Containers are **opaque byte stores**: the whole payload is read or
/// replaced in one call. The container owns the encryption format; callers
/// only ever see plaintext.
///
/// # Invariants
///
/// - `read` returns exactly the payload passed to the last successful `write`
/// - `write` replaces the previous payload as a whole
/// - after `destroy`, every `read` and `write` fails with
///   [`StorageError::Destroyed`](crate::StorageError::Destroyed)
///
/// # Implementors
///
/// - [`super::EncryptedFile`] - AES-256-GCM file on disk
/// - [`super::InMemoryContainer`] - For testing
pub trait ContainerBackend: Send {
    /// Reads and decrypts the full payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be read, is malformed, or
    /// fails authentication.
    fn read(&mut self) -> StorageResult<Vec<u8>>;

    /// Encrypts `payload` and replaces the stored container with it.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the underlying write fails.
    fn write(&mut self, payload: &[u8]) -> StorageResult<()>;

    /// Releases every resource held by the container.
    ///
    /// Calling `destroy` more than once is a no-op.
    fn destroy(&mut self);
}

/// Creates containers and answers existence checks for locations.
pub trait ContainerProvider: Send + Sync {
    /// Returns true if a container is stored at `location`.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self, location: &Path) -> StorageResult<bool>;

    /// Binds a container to `location`.
    ///
    /// Opening never touches the stored bytes; the first `read` or `write`
    /// does.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be constructed.
    fn open(
        &self,
        location: &Path,
        passphrase: &[u8],
        header: &ContainerHeader,
    ) -> StorageResult<Box<dyn ContainerBackend>>;
}
