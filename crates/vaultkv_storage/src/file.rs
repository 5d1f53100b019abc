//! File-based encrypted container.

use crate::backend::{ContainerBackend, ContainerHeader, ContainerProvider};
use crate::encrypted::{parse_header, seal, unseal};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

/// Suffix of the advisory lock file next to the container.
const LOCK_SUFFIX: &str = ".lock";
/// Suffix of the temporary file used for atomic replacement.
const TEMP_SUFFIX: &str = ".tmp";

/// An encrypted container stored in a single file.
///
/// Construction touches nothing on disk. The first `read` or `write`
/// acquires an exclusive advisory lock on `<path>.lock`, which is held until
/// [`destroy`](ContainerBackend::destroy) or drop.
///
/// # Durability
///
/// `write` seals the payload into `<path>.tmp`, syncs it, renames it over
/// `<path>` and syncs the parent directory, so a crash leaves either the old
/// or the new container.
///
/// # Example
///
/// ```no_run
/// use vaultkv_storage::{ContainerBackend, ContainerHeader, EncryptedFile};
/// use std::path::Path;
///
/// let mut file = EncryptedFile::new(Path::new("data.vault"), b"passphrase", ContainerHeader::default());
/// file.write(b"secret").unwrap();
/// assert_eq!(file.read().unwrap(), b"secret");
/// file.destroy();
/// ```
pub struct EncryptedFile {
    path: PathBuf,
    passphrase: Zeroizing<Vec<u8>>,
    header: ContainerHeader,
    /// Lock file handle (held for exclusive access).
    lock: Option<File>,
    destroyed: bool,
}

impl EncryptedFile {
    /// Binds a container to `path` without touching the file system.
    pub fn new(path: &Path, passphrase: &[u8], header: ContainerHeader) -> Self {
        Self {
            path: path.to_path_buf(),
            passphrase: Zeroizing::new(passphrase.to_vec()),
            header,
            lock: None,
            destroyed: false,
        }
    }

    /// Returns the path to the container file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the header used for the next write.
    #[must_use]
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Reads the cleartext header of the container at `path`.
    ///
    /// No passphrase is needed and no lock is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has no valid header.
    pub fn read_header(path: &Path) -> StorageResult<ContainerHeader> {
        let data = fs::read(path)?;
        parse_header(&data).map(|(header, _)| header)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn ensure_locked(&mut self) -> StorageResult<()> {
        if self.destroyed {
            return Err(StorageError::Destroyed);
        }
        if self.lock.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = self.sibling(LOCK_SUFFIX);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // Try to acquire exclusive lock (non-blocking)
        if lock_file.try_lock_exclusive().is_err() {
            warn!(path = %lock_path.display(), "container already locked");
            return Err(StorageError::Locked { path: lock_path });
        }

        self.lock = Some(lock_file);
        Ok(())
    }

    /// Syncs the parent directory so the rename is durable.
    #[cfg(unix)]
    fn sync_parent(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            let dir = if parent.as_os_str().is_empty() {
                File::open(".")?
            } else {
                File::open(parent)?
            };
            dir.sync_all()?;
        }
        Ok(())
    }

    /// NTFS journals metadata; there is no directory handle to sync.
    #[cfg(not(unix))]
    fn sync_parent(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl ContainerBackend for EncryptedFile {
    fn read(&mut self) -> StorageResult<Vec<u8>> {
        self.ensure_locked()?;

        let sealed = fs::read(&self.path)?;
        let (stored_header, plaintext) = unseal(&self.passphrase, &sealed)?;

        // Keep the application metadata of an existing container unless the
        // caller supplied its own.
        if self.header.is_empty() {
            self.header = stored_header;
        }

        debug!(path = %self.path.display(), bytes = plaintext.len(), "read container");
        Ok(plaintext)
    }

    fn write(&mut self, payload: &[u8]) -> StorageResult<()> {
        self.ensure_locked()?;

        let sealed = seal(&self.passphrase, &self.header, payload)?;
        let temp_path = self.sibling(TEMP_SUFFIX);

        let mut file = File::create(&temp_path)?;
        file.write_all(&sealed)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        self.sync_parent()?;

        debug!(path = %self.path.display(), bytes = sealed.len(), "wrote container");
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(lock) = self.lock.take() {
            if let Err(e) = FileExt::unlock(&lock) {
                warn!(path = %self.path.display(), error = %e, "failed to release container lock");
            }
        }
        self.passphrase.zeroize();
        debug!(path = %self.path.display(), "destroyed container handle");
    }
}

impl Drop for EncryptedFile {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for EncryptedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFile")
            .field("path", &self.path)
            .field("passphrase", &"[REDACTED]")
            .field("header", &self.header)
            .field("locked", &self.lock.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Provider that stores every container as an [`EncryptedFile`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

impl FileProvider {
    /// Creates a file provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ContainerProvider for FileProvider {
    fn exists(&self, location: &Path) -> StorageResult<bool> {
        Ok(location.try_exists()?)
    }

    fn open(
        &self,
        location: &Path,
        passphrase: &[u8],
        header: &ContainerHeader,
    ) -> StorageResult<Box<dyn ContainerBackend>> {
        Ok(Box::new(EncryptedFile::new(
            location,
            passphrase,
            header.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn app_header() -> ContainerHeader {
        ContainerHeader::new("vaultkv-tests", "1.0.0")
    }

    #[test]
    fn new_does_not_touch_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        let file = EncryptedFile::new(&path, b"pw", app_header());
        assert_eq!(file.path(), path);
        assert!(!path.exists());
        assert!(!dir.path().join("data.vault.lock").exists());
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        let mut file = EncryptedFile::new(&path, b"pw", app_header());
        file.write(b"hello world").unwrap();
        assert!(path.exists());
        assert_eq!(file.read().unwrap(), b"hello world");
    }

    #[test]
    fn write_replaces_previous_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        let mut file = EncryptedFile::new(&path, b"pw", app_header());
        file.write(b"a much longer first payload").unwrap();
        file.write(b"short").unwrap();

        assert_eq!(file.read().unwrap(), b"short");
        assert!(!dir.path().join("data.vault.tmp").exists());
    }

    #[test]
    fn persistence_across_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        {
            let mut file = EncryptedFile::new(&path, b"pw", app_header());
            file.write(b"persistent data").unwrap();
        }

        let mut file = EncryptedFile::new(&path, b"pw", ContainerHeader::default());
        assert_eq!(file.read().unwrap(), b"persistent data");
        // Stored metadata is adopted when none was supplied
        assert_eq!(file.header(), &app_header());
    }

    #[test]
    fn wrong_passphrase_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        EncryptedFile::new(&path, b"right", app_header())
            .write(b"secret")
            .unwrap();

        let mut file = EncryptedFile::new(&path, b"wrong", app_header());
        let err = file.read().unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let mut file = EncryptedFile::new(&dir.path().join("missing.vault"), b"", app_header());
        assert!(matches!(file.read(), Err(StorageError::Io(_))));
    }

    #[test]
    fn read_header_without_passphrase() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        EncryptedFile::new(&path, b"pw", app_header())
            .write(b"secret")
            .unwrap();

        assert_eq!(EncryptedFile::read_header(&path).unwrap(), app_header());
    }

    #[test]
    fn second_handle_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        let mut first = EncryptedFile::new(&path, b"pw", app_header());
        first.write(b"one").unwrap();

        let mut second = EncryptedFile::new(&path, b"pw", app_header());
        assert!(matches!(second.read(), Err(StorageError::Locked { .. })));

        first.destroy();
        assert_eq!(second.read().unwrap(), b"one");
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        {
            let mut file = EncryptedFile::new(&path, b"pw", app_header());
            file.write(b"x").unwrap();
        }

        let mut file = EncryptedFile::new(&path, b"pw", app_header());
        assert!(file.read().is_ok());
    }

    #[test]
    fn destroyed_container_rejects_access() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");

        let mut file = EncryptedFile::new(&path, b"pw", app_header());
        file.write(b"x").unwrap();
        file.destroy();
        file.destroy();

        assert!(matches!(file.read(), Err(StorageError::Destroyed)));
        assert!(matches!(file.write(b"y"), Err(StorageError::Destroyed)));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("data.vault");

        let mut file = EncryptedFile::new(&path, b"", app_header());
        file.write(b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn provider_exists_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.vault");
        let provider = FileProvider::new();

        assert!(!provider.exists(&path).unwrap());
        let mut container = provider.open(&path, b"pw", &app_header()).unwrap();
        assert!(!provider.exists(&path).unwrap());

        container.write(b"payload").unwrap();
        assert!(provider.exists(&path).unwrap());
        assert_eq!(container.read().unwrap(), b"payload");
    }

    #[test]
    fn debug_redacts_passphrase() {
        let file = EncryptedFile::new(Path::new("x.vault"), b"hunter2", app_header());
        let debug = format!("{file:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));
    }
}
