//! # VaultKV Testkit
//!
//! Test utilities for VaultKV.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A model-checking harness for any `OrderedStore`
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use vaultkv_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.put(b"key", Some(b"value")).unwrap();
//!     assert!(!store.is_empty());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
