//! # VaultKV Storage
//!
//! Encrypted single-file containers for VaultKV.
//!
//! This crate provides the lowest-level storage abstraction for VaultKV.
//! A container is an **opaque encrypted blob**: it is read and replaced as
//! a whole, and it does not interpret the plaintext it stores.
//!
//! ## Design Principles
//!
//! - Containers only know how to seal, store and unseal bytes
//! - No knowledge of keys, values or the document format
//! - Constructing a container never touches disk; existence checks go
//!   through the provider
//! - VaultKV core owns the plaintext format
//!
//! ## Available Providers
//!
//! - [`FileProvider`] / [`EncryptedFile`] - AES-256-GCM file on disk
//! - [`MemoryProvider`] / [`InMemoryContainer`] - For testing
//!
//! ## Example
//!
//! ```rust
//! use vaultkv_storage::{ContainerBackend, ContainerHeader, ContainerProvider, MemoryProvider};
//! use std::path::Path;
//!
//! let provider = MemoryProvider::new();
//! let location = Path::new("mem://example");
//! assert!(!provider.exists(location).unwrap());
//!
//! let mut container = provider.open(location, b"passphrase", &ContainerHeader::default()).unwrap();
//! container.write(b"hello world").unwrap();
//! assert_eq!(container.read().unwrap(), b"hello world");
//! container.destroy();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod encrypted;
mod error;
mod file;
mod memory;

pub use backend::{ContainerBackend, ContainerHeader, ContainerProvider};
pub use encrypted::{
    parse_header, seal, unseal, EncryptionKey, FORMAT_VERSION, KEY_SIZE, MAGIC, NONCE_SIZE,
    SALT_SIZE, TAG_SIZE,
};
pub use error::{StorageError, StorageResult};
pub use file::{EncryptedFile, FileProvider};
pub use memory::{InMemoryContainer, MemoryProvider};
