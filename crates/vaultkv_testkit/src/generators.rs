//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys, values and operation
//! sequences. Keys are drawn from a small alphabet so that generated
//! operations collide often enough to exercise overwrites and deletes.

use proptest::prelude::*;
use vaultkv_core::BatchOp;

/// Strategy for generating keys, including non-UTF-8 bytes.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        3 => prop::string::string_regex("[a-f]{1,3}")
            .expect("Invalid regex")
            .prop_map(String::into_bytes),
        1 => prop::collection::vec(any::<u8>(), 1..4),
        1 => Just(b"base64:".to_vec()),
    ]
}

/// Strategy for generating values (arbitrary bytes, possibly empty).
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        3 => prop::string::string_regex("[ -~]{0,24}")
            .expect("Invalid regex")
            .prop_map(String::into_bytes),
        1 => prop::collection::vec(any::<u8>(), 0..64),
    ]
}

/// Strategy for generating a single batch operation.
pub fn batch_op_strategy() -> impl Strategy<Value = BatchOp> {
    prop_oneof![
        3 => (key_strategy(), prop::option::of(value_strategy()))
            .prop_map(|(key, value)| BatchOp::Put { key, value }),
        1 => key_strategy().prop_map(|key| BatchOp::Del { key }),
    ]
}

/// An operation applied to a store by a test.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Put a value
    Put {
        /// Key
        key: Vec<u8>,
        /// Value
        value: Option<Vec<u8>>,
    },
    /// Delete a key
    Delete {
        /// Key
        key: Vec<u8>,
    },
    /// Read a key
    Get {
        /// Key
        key: Vec<u8>,
    },
    /// Apply a batch
    Batch {
        /// Operations
        ops: Vec<BatchOp>,
    },
    /// Close and reopen the store
    Reopen,
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => (key_strategy(), prop::option::of(value_strategy()))
            .prop_map(|(key, value)| StoreOperation::Put { key, value }),
        2 => key_strategy().prop_map(|key| StoreOperation::Delete { key }),
        2 => key_strategy().prop_map(|key| StoreOperation::Get { key }),
        1 => prop::collection::vec(batch_op_strategy(), 0..6)
            .prop_map(|ops| StoreOperation::Batch { ops }),
        1 => Just(StoreOperation::Reopen),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
