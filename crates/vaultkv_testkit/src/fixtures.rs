//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vaultkv_core::{Engine, OpenOptions};
use vaultkv_storage::MemoryProvider;

/// Passphrase used by file-backed fixtures.
pub const TEST_PASSPHRASE: &str = "testkit passphrase";

/// Location used by memory-backed fixtures.
pub const MEMORY_LOCATION: &str = "mem://testkit";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The engine instance.
    pub engine: Engine,
    /// The provider, when the store is memory-backed.
    provider: Option<MemoryProvider>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an open store backed by a [`MemoryProvider`].
    pub fn memory() -> Self {
        let provider = MemoryProvider::new();
        let engine = Engine::with_provider(MEMORY_LOCATION, Arc::new(provider.clone()));
        engine
            .open(&OpenOptions::default())
            .expect("Failed to open memory store");
        Self {
            engine,
            provider: Some(provider),
            _temp_dir: None,
        }
    }

    /// Creates an open store backed by an encrypted file in a temp directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let engine = Engine::new(temp_dir.path().join("store.vkv"));
        engine
            .open(&Self::file_options())
            .expect("Failed to open file store");
        Self {
            engine,
            provider: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Options used to open file-backed stores.
    #[must_use]
    pub fn file_options() -> OpenOptions {
        OpenOptions::new().passphrase(TEST_PASSPHRASE)
    }

    /// Returns the options this store was opened with.
    #[must_use]
    pub fn options(&self) -> OpenOptions {
        if self.provider.is_some() {
            OpenOptions::default()
        } else {
            Self::file_options()
        }
    }

    /// Returns the memory provider, if memory-backed.
    pub fn provider(&self) -> Option<&MemoryProvider> {
        self.provider.as_ref()
    }

    /// Returns the container location.
    pub fn location(&self) -> &Path {
        self.engine.location()
    }

    /// Returns the data file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir
            .as_ref()
            .map(|_| self.engine.location().to_path_buf())
    }

    /// Closes and reopens the engine with the same options.
    pub fn reopen(&self) {
        self.engine.close().expect("Failed to close store");
        self.engine
            .open(&self.options())
            .expect("Failed to reopen store");
    }
}

impl std::ops::Deref for TestStore {
    type Target = Engine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// Runs a test with a temporary memory-backed store.
///
/// # Example
///
/// ```rust
/// use vaultkv_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     store.put(b"key", Some(b"value")).unwrap();
///     assert_eq!(store.len(), 1);
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Engine) -> R,
{
    let store = TestStore::memory();
    f(&store.engine)
}

/// Runs a test with a temporary file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Engine, &Path) -> R,
{
    let store = TestStore::file();
    let path = store.path().expect("File store should have a path");
    f(&store.engine, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Key used for entry `i` of a populated store.
    #[must_use]
    pub fn key(i: usize) -> Vec<u8> {
        format!("key-{i:06}").into_bytes()
    }

    /// Value used for entry `i` of a populated store.
    #[must_use]
    pub fn value(i: usize) -> Vec<u8> {
        format!("value-{i}").into_bytes()
    }

    /// Creates a memory store with `count` entries written in one batch.
    pub fn populated_store(count: usize) -> TestStore {
        let store = TestStore::memory();
        let ops = (0..count)
            .map(|i| vaultkv_core::BatchOp::put(key(i), value(i)))
            .collect();
        store.batch(ops).expect("Failed to populate store");
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultkv_core::{EngineStatus, ReadOptions};

    #[test]
    fn memory_store_is_open() {
        let store = TestStore::memory();
        assert_eq!(store.status(), EngineStatus::Open);
        assert!(store.path().is_none());
        assert_eq!(
            store.provider().unwrap().write_count(store.location()),
            1
        );
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let store = TestStore::file();
        store.put(b"k", Some(b"v")).unwrap();
        store.reopen();

        let value = store.get(b"k", &ReadOptions::default()).unwrap();
        assert_eq!(value.as_bytes(), b"v");
        assert!(store.path().unwrap().exists());
    }

    #[test]
    fn populated_store_has_entries() {
        let store = scenarios::populated_store(50);
        assert_eq!(store.len(), 50);
        let value = store
            .get(&scenarios::key(7), &ReadOptions::default())
            .unwrap();
        assert_eq!(value.into_bytes(), scenarios::value(7));
    }

    #[test]
    fn helpers_run_closure() {
        let len = with_temp_store(|store| {
            store.put(b"a", None).unwrap();
            store.len()
        });
        assert_eq!(len, 1);

        with_file_store(|store, path| {
            store.put(b"a", None).unwrap();
            assert!(path.exists());
        });
    }
}
