//! Engine configuration.

use std::fmt;
use vaultkv_storage::ContainerHeader;
use zeroize::Zeroizing;

/// Configuration for opening an engine.
#[derive(Clone)]
pub struct OpenOptions {
    /// Passphrase the container key is derived from.
    pub passphrase: Zeroizing<Vec<u8>>,

    /// Cleartext header stored with newly written containers.
    pub header: ContainerHeader,

    /// Whether to create the file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the file already exists.
    pub error_if_exists: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            passphrase: Zeroizing::new(Vec::new()),
            header: ContainerHeader::default(),
            create_if_missing: true,
            error_if_exists: false,
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("passphrase", &"[REDACTED]")
            .field("header", &self.header)
            .field("create_if_missing", &self.create_if_missing)
            .field("error_if_exists", &self.error_if_exists)
            .finish()
    }
}

impl OpenOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the passphrase.
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl AsRef<[u8]>) -> Self {
        self.passphrase = Zeroizing::new(passphrase.as_ref().to_vec());
        self
    }

    /// Sets the container header.
    #[must_use]
    pub fn header(mut self, header: ContainerHeader) -> Self {
        self.header = header;
        self
    }

    /// Sets whether to create the file if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the file exists.
    #[must_use]
    pub fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }
}

/// Options for point reads.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Return values as bytes rather than text.
    pub as_buffer: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { as_buffer: true }
    }
}

impl ReadOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether values are returned as bytes.
    #[must_use]
    pub const fn as_buffer(mut self, value: bool) -> Self {
        self.as_buffer = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = OpenOptions::default();
        assert!(options.passphrase.is_empty());
        assert!(options.header.is_empty());
        assert!(options.create_if_missing);
        assert!(!options.error_if_exists);
    }

    #[test]
    fn builder_pattern() {
        let options = OpenOptions::new()
            .passphrase("secret")
            .header(ContainerHeader::new("notes", "2.1"))
            .create_if_missing(false)
            .error_if_exists(true);

        assert_eq!(options.passphrase.as_slice(), b"secret");
        assert_eq!(options.header.app_name, "notes");
        assert!(!options.create_if_missing);
        assert!(options.error_if_exists);
    }

    #[test]
    fn debug_redacts_passphrase() {
        let options = OpenOptions::new().passphrase("hunter2");
        let debug = format!("{options:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn read_options() {
        assert!(ReadOptions::default().as_buffer);
        assert!(!ReadOptions::new().as_buffer(false).as_buffer);
    }
}
