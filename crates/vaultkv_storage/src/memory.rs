//! In-memory containers for testing.

use crate::backend::{ContainerBackend, ContainerHeader, ContainerProvider};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use zeroize::Zeroizing;

/// A container stored in a [`MemoryProvider`].
#[derive(Debug, Clone)]
struct StoredContainer {
    passphrase: Zeroizing<Vec<u8>>,
    header: ContainerHeader,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: HashMap<PathBuf, StoredContainer>,
    /// Every payload written per location, oldest first.
    history: HashMap<PathBuf, Vec<Vec<u8>>>,
    fail_writes: bool,
    write_delay: Duration,
    in_flight: usize,
    max_in_flight: usize,
    destroyed: u64,
    access_after_destroy: u64,
}

/// A provider that keeps containers in memory.
///
/// Clones share the same storage, so an engine can be closed and reopened
/// against the same provider. Besides storage, the provider records
/// what tests need to observe:
/// - every payload written per location
/// - the highest number of writes that overlapped in time
/// - accesses made through a destroyed container
///
/// It can also inject write failures and slow writes down.
///
/// # Example
///
/// ```rust
/// use vaultkv_storage::{ContainerBackend, ContainerHeader, ContainerProvider, MemoryProvider};
/// use std::path::Path;
///
/// let provider = MemoryProvider::new();
/// let location = Path::new("mem://test");
/// let mut container = provider.open(location, b"", &ContainerHeader::default()).unwrap();
/// container.write(b"payload").unwrap();
/// assert_eq!(provider.write_count(location), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successful writes made to `location`.
    #[must_use]
    pub fn write_count(&self, location: &Path) -> usize {
        self.state
            .lock()
            .history
            .get(location)
            .map_or(0, Vec::len)
    }

    /// Returns every payload written to `location`, oldest first.
    #[must_use]
    pub fn write_history(&self, location: &Path) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .history
            .get(location)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the plaintext payload currently stored at `location`.
    #[must_use]
    pub fn payload(&self, location: &Path) -> Option<Vec<u8>> {
        self.state
            .lock()
            .containers
            .get(location)
            .map(|c| c.payload.clone())
    }

    /// Returns the header currently stored at `location`.
    #[must_use]
    pub fn header(&self, location: &Path) -> Option<ContainerHeader> {
        self.state
            .lock()
            .containers
            .get(location)
            .map(|c| c.header.clone())
    }

    /// Stores a raw payload at `location`, bypassing any container.
    ///
    /// Useful for seeding corrupt or legacy data.
    pub fn insert_payload(&self, location: &Path, passphrase: &[u8], payload: Vec<u8>) {
        self.state.lock().containers.insert(
            location.to_path_buf(),
            StoredContainer {
                passphrase: Zeroizing::new(passphrase.to_vec()),
                header: ContainerHeader::default(),
                payload,
            },
        );
    }

    /// Makes every following write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Delays every following write by `delay`.
    pub fn set_write_delay(&self, delay: Duration) {
        self.state.lock().write_delay = delay;
    }

    /// Returns the highest number of writes that were in flight at once.
    #[must_use]
    pub fn max_concurrent_writes(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// Returns how many containers have been destroyed.
    #[must_use]
    pub fn destroyed_count(&self) -> u64 {
        self.state.lock().destroyed
    }

    /// Returns how many reads or writes hit an already destroyed container.
    #[must_use]
    pub fn access_after_destroy(&self) -> u64 {
        self.state.lock().access_after_destroy
    }
}

impl ContainerProvider for MemoryProvider {
    fn exists(&self, location: &Path) -> StorageResult<bool> {
        Ok(self.state.lock().containers.contains_key(location))
    }

    fn open(
        &self,
        location: &Path,
        passphrase: &[u8],
        header: &ContainerHeader,
    ) -> StorageResult<Box<dyn ContainerBackend>> {
        Ok(Box::new(InMemoryContainer {
            location: location.to_path_buf(),
            passphrase: Zeroizing::new(passphrase.to_vec()),
            header: header.clone(),
            state: Arc::clone(&self.state),
            destroyed: false,
        }))
    }
}

/// A container handle backed by a [`MemoryProvider`].
///
/// The passphrase is checked on read the way a real cipher would reject a
/// wrong key.
#[derive(Debug)]
pub struct InMemoryContainer {
    location: PathBuf,
    passphrase: Zeroizing<Vec<u8>>,
    header: ContainerHeader,
    state: Arc<Mutex<MemoryState>>,
    destroyed: bool,
}

impl InMemoryContainer {
    fn check_alive(&self) -> StorageResult<()> {
        if self.destroyed {
            self.state.lock().access_after_destroy += 1;
            return Err(StorageError::Destroyed);
        }
        Ok(())
    }
}

impl ContainerBackend for InMemoryContainer {
    fn read(&mut self) -> StorageResult<Vec<u8>> {
        self.check_alive()?;

        let state = self.state.lock();
        let stored = state.containers.get(&self.location).ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no container at {}", self.location.display()),
            ))
        })?;

        if stored.passphrase.as_slice() != self.passphrase.as_slice() {
            return Err(StorageError::Encryption(
                "authentication failed: wrong passphrase".to_string(),
            ));
        }
        Ok(stored.payload.clone())
    }

    fn write(&mut self, payload: &[u8]) -> StorageResult<()> {
        self.check_alive()?;

        let delay = {
            let mut state = self.state.lock();
            if state.fail_writes {
                return Err(StorageError::Injected("write failure".to_string()));
            }
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.write_delay
        };

        // Sleep outside the lock so overlapping writes would be observable
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let mut state = self.state.lock();
        state.in_flight -= 1;
        state.containers.insert(
            self.location.clone(),
            StoredContainer {
                passphrase: self.passphrase.clone(),
                header: self.header.clone(),
                payload: payload.to_vec(),
            },
        );
        state
            .history
            .entry(self.location.clone())
            .or_default()
            .push(payload.to_vec());
        Ok(())
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.state.lock().destroyed += 1;
        }
    }
}
