//! # VaultKV Core
//!
//! Core store engine for VaultKV.
//!
//! This crate provides:
//! - An ordered in-memory keyspace mirrored into one encrypted container
//! - The document codec (JSON, gzip, binary-safe text encoding)
//! - Serialized persistence: one full rewrite per mutation, never overlapping
//! - Snapshot range iteration
//! - The [`OrderedStore`] trait implemented by [`Engine`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vaultkv_core::{BatchOp, Engine, IteratorOptions, OpenOptions, ReadOptions};
//! use vaultkv_storage::MemoryProvider;
//!
//! let engine = Engine::with_provider("mem://docs", Arc::new(MemoryProvider::new()));
//! engine.open(&OpenOptions::new().passphrase("secret")).unwrap();
//!
//! engine
//!     .batch(vec![BatchOp::put("a", "1"), BatchOp::put("b", "2")])
//!     .unwrap();
//! let value = engine.get(b"a", &ReadOptions::default()).unwrap();
//! assert_eq!(value.as_bytes(), b"1");
//!
//! let keys: Vec<_> = engine
//!     .iterator(&IteratorOptions::new().reverse(true))
//!     .unwrap()
//!     .filter_map(|entry| entry.key)
//!     .collect();
//! assert_eq!(keys.len(), 2);
//!
//! engine.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod config;
mod engine;
mod error;
mod iterator;
mod keyspace;
mod store;
mod types;
mod write_serializer;

pub use config::{OpenOptions, ReadOptions};
pub use engine::Engine;
pub use error::{StoreError, StoreResult};
pub use iterator::{IterEntry, IteratorOptions, RangeIterator};
pub use keyspace::Keyspace;
pub use store::OrderedStore;
pub use types::{BatchOp, Datum, EngineStatus, RawBatchOp, WriteStats};
pub use write_serializer::{PendingWrite, WriteJob, WriteSerializer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
