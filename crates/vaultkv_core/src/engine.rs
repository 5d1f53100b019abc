//! Engine facade and lifecycle.

use crate::codec;
use crate::config::{OpenOptions, ReadOptions};
use crate::error::{StoreError, StoreResult};
use crate::iterator::{IteratorOptions, RangeIterator};
use crate::keyspace::Keyspace;
use crate::store::OrderedStore;
use crate::types::{BatchOp, Datum, EngineStatus, RawBatchOp, WriteStats};
use crate::write_serializer::{PendingWrite, WriteSerializer};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vaultkv_storage::{ContainerBackend, ContainerProvider, FileProvider};

/// Resources that exist only while the engine is open.
struct Session {
    container: Arc<Mutex<Box<dyn ContainerBackend>>>,
    serializer: WriteSerializer,
}

struct Lifecycle {
    status: EngineStatus,
    session: Option<Session>,
}

/// The main store handle.
///
/// An `Engine` keeps the whole keyspace in memory and mirrors it into one
/// encrypted container. Every mutation updates memory first, then queues a
/// rewrite of the full container; rewrites run one at a time in commit
/// order.
///
/// # Opening an Engine
///
/// ```rust,ignore
/// use vaultkv_core::{Engine, OpenOptions, ReadOptions};
///
/// let engine = Engine::open_with_options(
///     "secrets.vkv",
///     OpenOptions::new().passphrase("correct horse battery staple"),
/// )?;
///
/// engine.put(b"api-token", Some(b"abc123"))?;
/// let token = engine.get(b"api-token", &ReadOptions::default())?;
///
/// engine.close()?;
/// ```
///
/// # Lifecycle
///
/// A new engine is `Unopened`. [`Engine::open`] loads (or creates) the
/// container and makes it `Open`; [`Engine::close`] waits for every queued
/// write, releases the container and makes it `Closed`. A closed engine can
/// be opened again.
pub struct Engine {
    location: PathBuf,
    provider: Arc<dyn ContainerProvider>,
    keyspace: Arc<RwLock<Keyspace>>,
    lifecycle: RwLock<Lifecycle>,
}

impl Engine {
    /// Creates an unopened engine backed by an encrypted file at `location`.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self::with_provider(location, Arc::new(FileProvider::new()))
    }

    /// Creates an unopened engine using a custom container provider.
    pub fn with_provider(location: impl Into<PathBuf>, provider: Arc<dyn ContainerProvider>) -> Self {
        Self {
            location: location.into(),
            provider,
            keyspace: Arc::new(RwLock::new(Keyspace::new())),
            lifecycle: RwLock::new(Lifecycle {
                status: EngineStatus::Unopened,
                session: None,
            }),
        }
    }

    /// Creates an engine backed by an encrypted file and opens it.
    pub fn open_with_options(location: impl Into<PathBuf>, options: OpenOptions) -> StoreResult<Self> {
        let engine = Self::new(location);
        engine.open(&options)?;
        Ok(engine)
    }

    /// Returns the container location.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.lifecycle.read().status
    }

    /// Opens the engine.
    ///
    /// # Errors
    ///
    /// - `State` if the engine is already open
    /// - `NotFound` if the container is missing and `create_if_missing` is false
    /// - `Precondition` if the container exists and `error_if_exists` is true
    /// - `Corruption` if the container cannot be decrypted or decoded
    /// - `Storage` for other container failures
    pub fn open(&self, options: &OpenOptions) -> StoreResult<()> {
        let mut lifecycle = self.lifecycle.write();
        if lifecycle.status == EngineStatus::Open {
            return Err(StoreError::state("engine is already open"));
        }

        let mut container =
            self.provider
                .open(&self.location, &options.passphrase, &options.header)?;

        let loaded = self
            .load(container.as_mut(), options)
            .and_then(|loaded| Ok((loaded, WriteSerializer::spawn()?)));
        let ((keyspace, created), serializer) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                container.destroy();
                return Err(e);
            }
        };

        let entries = keyspace.len();
        *self.keyspace.write() = keyspace;
        lifecycle.session = Some(Session {
            container: Arc::new(Mutex::new(container)),
            serializer,
        });
        lifecycle.status = EngineStatus::Open;

        tracing::info!(
            location = %self.location.display(),
            entries,
            created,
            "opened store"
        );
        Ok(())
    }

    /// Reads the existing container or creates an empty one.
    ///
    /// Returns the keyspace and whether the container was created.
    fn load(
        &self,
        container: &mut dyn ContainerBackend,
        options: &OpenOptions,
    ) -> StoreResult<(Keyspace, bool)> {
        if !self.provider.exists(&self.location)? {
            if !options.create_if_missing {
                return Err(StoreError::not_found(format!(
                    "{} does not exist",
                    self.location.display()
                )));
            }

            let keyspace = Keyspace::new();
            let payload = codec::encode_keyspace(&keyspace)?;
            container
                .write(&payload)
                .map_err(|e| StoreError::write(format!("failed to create store: {e}")))?;
            return Ok((keyspace, true));
        }

        if options.error_if_exists {
            return Err(StoreError::precondition(format!(
                "{} exists and error_if_exists is true",
                self.location.display()
            )));
        }

        let payload = container.read().map_err(|e| {
            if e.is_decode_failure() {
                StoreError::corruption(e.to_string())
            } else {
                StoreError::Storage(e)
            }
        })?;
        Ok((codec::decode_keyspace(&payload)?, false))
    }

    /// Closes the engine.
    ///
    /// Waits until every queued write has finished, then releases the
    /// container. Errors of drained writes go to the callers that submitted
    /// them. Closing a closed engine does nothing.
    ///
    /// # Errors
    ///
    /// Returns `State` if the engine was never opened.
    pub fn close(&self) -> StoreResult<()> {
        // Held until the container is released so a concurrent open cannot
        // start writing while old jobs are still draining
        let mut lifecycle = self.lifecycle.write();
        match lifecycle.status {
            EngineStatus::Unopened => return Err(StoreError::state("engine is not open")),
            EngineStatus::Closed => return Ok(()),
            EngineStatus::Open => {}
        }
        lifecycle.status = EngineStatus::Closed;

        if let Some(Session {
            container,
            serializer,
        }) = lifecycle.session.take()
        {
            let stats = serializer.stats();
            serializer.shutdown();
            container.lock().destroy();
            tracing::debug!(
                completed = stats.completed,
                failed = stats.failed,
                drained = stats.pending,
                "write serializer stopped"
            );
        }
        self.keyspace.write().clear();

        tracing::info!(location = %self.location.display(), "closed store");
        Ok(())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyspace.read().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyspace.read().is_empty()
    }

    /// Returns the number of queued and in-flight writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.lifecycle
            .read()
            .session
            .as_ref()
            .map_or(0, |s| s.serializer.pending())
    }

    /// Returns write counters for the current session.
    #[must_use]
    pub fn write_stats(&self) -> WriteStats {
        self.lifecycle
            .read()
            .session
            .as_ref()
            .map(|s| s.serializer.stats())
            .unwrap_or_default()
    }

    /// Returns the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent.
    pub fn get(&self, key: &[u8], options: &ReadOptions) -> StoreResult<Datum> {
        let lifecycle = self.lifecycle.read();
        Self::session(&lifecycle)?;

        self.keyspace
            .read()
            .get(key)
            .map(|value| Datum::from_stored(value.to_vec(), options.as_buffer))
            .ok_or_else(|| StoreError::not_found("key not found"))
    }

    /// Sets `key` to `value` and waits for the write.
    ///
    /// A failed write leaves the in-memory change in place.
    pub fn put(&self, key: &[u8], value: Option<&[u8]>) -> StoreResult<()> {
        self.submit_put(key, value)?.wait()
    }

    /// Removes `key` and waits for the write.
    pub fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.submit_delete(key)?.wait()
    }

    /// Applies `ops` in order and waits for the single resulting write.
    pub fn batch(&self, ops: Vec<BatchOp>) -> StoreResult<()> {
        self.submit_batch(ops)?.wait()
    }

    /// Sets `key` to `value` and returns without waiting for the write.
    pub fn submit_put(&self, key: &[u8], value: Option<&[u8]>) -> StoreResult<PendingWrite> {
        self.mutate(|keyspace| {
            keyspace.put(key.to_vec(), value.unwrap_or_default().to_vec());
            Ok(())
        })
    }

    /// Removes `key` and returns without waiting for the write.
    pub fn submit_delete(&self, key: &[u8]) -> StoreResult<PendingWrite> {
        self.mutate(|keyspace| {
            keyspace.delete(key);
            Ok(())
        })
    }

    /// Applies `ops` and returns without waiting for the write.
    pub fn submit_batch(&self, ops: Vec<BatchOp>) -> StoreResult<PendingWrite> {
        self.mutate(|keyspace| {
            ops.into_iter().for_each(|op| apply(keyspace, op));
            Ok(())
        })
    }

    /// Applies untyped operations one by one and waits for the write.
    ///
    /// Operations are parsed as they are applied. When one has an unknown
    /// type the batch stops with `InvalidOperation`, the operations before
    /// it stay applied in memory, and nothing is written.
    pub fn batch_raw(&self, ops: Vec<RawBatchOp>) -> StoreResult<()> {
        self.mutate(|keyspace| {
            for raw in ops {
                let op = BatchOp::try_from(raw).inspect_err(|e| {
                    tracing::debug!(error = %e, "raw batch stopped");
                })?;
                apply(keyspace, op);
            }
            Ok(())
        })?
        .wait()
    }

    /// Creates an iterator over a snapshot of the requested range.
    pub fn iterator(&self, options: &IteratorOptions) -> StoreResult<RangeIterator> {
        let lifecycle = self.lifecycle.read();
        Self::session(&lifecycle)?;

        Ok(RangeIterator::new(&self.keyspace.read(), options.clone()))
    }

    fn session(lifecycle: &Lifecycle) -> StoreResult<&Session> {
        match (&lifecycle.status, &lifecycle.session) {
            (EngineStatus::Open, Some(session)) => Ok(session),
            (status, _) => Err(StoreError::state(format!("engine is {status}"))),
        }
    }

    /// Runs `change` under the keyspace write lock and queues a write.
    ///
    /// The job is submitted before the lock is released so the order of
    /// jobs matches the order of changes.
    fn mutate<F>(&self, change: F) -> StoreResult<PendingWrite>
    where
        F: FnOnce(&mut Keyspace) -> StoreResult<()>,
    {
        let lifecycle = self.lifecycle.read();
        let session = Self::session(&lifecycle)?;

        let mut keyspace = self.keyspace.write();
        change(&mut keyspace)?;

        let snapshot_source = Arc::clone(&self.keyspace);
        let container = Arc::clone(&session.container);
        let pending = session.serializer.submit(Box::new(move || {
            let payload = codec::encode_keyspace(&snapshot_source.read())?;
            container
                .lock()
                .write(&payload)
                .map_err(|e| StoreError::write(e.to_string()))
        }));
        drop(keyspace);
        Ok(pending)
    }
}

fn apply(keyspace: &mut Keyspace, op: BatchOp) {
    match op {
        BatchOp::Put { key, value } => keyspace.put(key, value.unwrap_or_default()),
        BatchOp::Del { key } => {
            keyspace.delete(&key);
        }
    }
}

impl OrderedStore for Engine {
    type Iter = RangeIterator;

    fn open(&self, options: &OpenOptions) -> StoreResult<()> {
        Engine::open(self, options)
    }

    fn close(&self) -> StoreResult<()> {
        Engine::close(self)
    }

    fn status(&self) -> EngineStatus {
        Engine::status(self)
    }

    fn get(&self, key: &[u8], options: &ReadOptions) -> StoreResult<Datum> {
        Engine::get(self, key, options)
    }

    fn put(&self, key: &[u8], value: Option<&[u8]>) -> StoreResult<()> {
        Engine::put(self, key, value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        Engine::delete(self, key)
    }

    fn batch(&self, ops: Vec<BatchOp>) -> StoreResult<()> {
        Engine::batch(self, ops)
    }

    fn iterator(&self, options: &IteratorOptions) -> StoreResult<RangeIterator> {
        Engine::iterator(self, options)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.status() == EngineStatus::Open {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "failed to close store on drop");
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("location", &self.location)
            .field("status", &self.status())
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
