//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] drives any [`OrderedStore`] alongside a plain
//! `BTreeMap` model and checks that the two agree.

use crate::generators::StoreOperation;
use std::collections::BTreeMap;
use vaultkv_core::{
    BatchOp, IterEntry, IteratorOptions, OpenOptions, OrderedStore, ReadOptions, StoreError,
};

/// A test harness that mirrors every operation into a model.
pub struct IntegrationHarness<S: OrderedStore> {
    /// The store under test.
    pub store: S,
    options: OpenOptions,
    model: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<S: OrderedStore> IntegrationHarness<S> {
    /// Wraps an open store whose contents are empty.
    ///
    /// `options` are used whenever the harness reopens the store.
    pub fn new(store: S, options: OpenOptions) -> Self {
        Self {
            store,
            options,
            model: BTreeMap::new(),
        }
    }

    /// Returns the model contents.
    pub fn model(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.model
    }

    /// Puts a value and records it.
    pub fn put(&mut self, key: &[u8], value: Option<&[u8]>) {
        self.store.put(key, value).expect("Failed to put");
        self.model
            .insert(key.to_vec(), value.unwrap_or_default().to_vec());
    }

    /// Deletes a key and records it.
    pub fn delete(&mut self, key: &[u8]) {
        self.store.delete(key).expect("Failed to delete");
        self.model.remove(key);
    }

    /// Applies a batch and records it.
    pub fn batch(&mut self, ops: Vec<BatchOp>) {
        self.store.batch(ops.clone()).expect("Failed to apply batch");
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    self.model.insert(key, value.unwrap_or_default());
                }
                BatchOp::Del { key } => {
                    self.model.remove(&key);
                }
            }
        }
    }

    /// Reads a key and checks it against the model.
    pub fn get_and_verify(&self, key: &[u8]) -> Option<Vec<u8>> {
        let actual = match self.store.get(key, &ReadOptions::default()) {
            Ok(value) => Some(value.into_bytes()),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => panic!("Failed to get {key:?}: {e}"),
        };
        assert_eq!(
            actual.as_ref(),
            self.model.get(key),
            "Value mismatch for key {key:?}"
        );
        actual
    }

    /// Closes and reopens the store.
    pub fn reopen(&mut self) {
        self.store.close().expect("Failed to close");
        self.store.open(&self.options).expect("Failed to reopen");
    }

    /// Applies one generated operation.
    pub fn apply(&mut self, op: StoreOperation) {
        match op {
            StoreOperation::Put { key, value } => self.put(&key, value.as_deref()),
            StoreOperation::Delete { key } => self.delete(&key),
            StoreOperation::Get { key } => {
                self.get_and_verify(&key);
            }
            StoreOperation::Batch { ops } => self.batch(ops),
            StoreOperation::Reopen => self.reopen(),
        }
    }

    /// Checks that a full scan matches the model, forwards and backwards.
    pub fn verify_all(&self) {
        let forward = self.scan(IteratorOptions::new());
        let expected: Vec<_> = self
            .model
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(forward, expected, "Forward scan mismatch");

        let mut backward = self.scan(IteratorOptions::new().reverse(true));
        backward.reverse();
        assert_eq!(backward, expected, "Reverse scan mismatch");

        for key in self.model.keys() {
            self.get_and_verify(key);
        }
    }

    /// Collects the entries an iterator yields.
    pub fn scan(&self, options: IteratorOptions) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.store
            .iterator(&options)
            .expect("Failed to create iterator")
            .map(|IterEntry { key, value }| {
                (
                    key.expect("Iterator entry without key").into_bytes(),
                    value.expect("Iterator entry without value").into_bytes(),
                )
            })
            .collect()
    }
}
