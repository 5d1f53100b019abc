//! The ordered key-value store interface.

use crate::config::{OpenOptions, ReadOptions};
use crate::error::StoreResult;
use crate::iterator::{IterEntry, IteratorOptions};
use crate::types::{BatchOp, Datum, EngineStatus};

/// An ordered key-value store with an explicit open/close lifecycle.
///
/// Mutating methods return once the change is applied in memory and the
/// resulting physical write has finished. Every method other than
/// [`open`](Self::open) and [`close`](Self::close) requires the store to be
/// open.
pub trait OrderedStore: Send + Sync {
    /// Iterator type returned by [`iterator`](Self::iterator).
    type Iter: Iterator<Item = IterEntry>;

    /// Opens the store.
    fn open(&self, options: &OpenOptions) -> StoreResult<()>;

    /// Waits for outstanding writes and releases the backing storage.
    fn close(&self) -> StoreResult<()>;

    /// Returns the lifecycle state.
    fn status(&self) -> EngineStatus;

    /// Returns the value stored for `key`.
    fn get(&self, key: &[u8], options: &ReadOptions) -> StoreResult<Datum>;

    /// Sets `key` to `value`. `None` stores an empty value.
    fn put(&self, key: &[u8], value: Option<&[u8]>) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Applies the operations in order and persists them with one write.
    fn batch(&self, ops: Vec<BatchOp>) -> StoreResult<()>;

    /// Creates an iterator over a snapshot of the requested range.
    fn iterator(&self, options: &IteratorOptions) -> StoreResult<Self::Iter>;
}
