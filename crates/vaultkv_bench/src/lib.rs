//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use std::sync::Arc;
use vaultkv_core::{BatchOp, Engine, Keyspace, OpenOptions};
use vaultkv_storage::MemoryProvider;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Key for entry `i`; fixed width so byte order matches numeric order.
pub fn bench_key(i: usize) -> Vec<u8> {
    format!("key-{i:08}").into_bytes()
}

/// Generate `count` entries with values of `value_size` bytes.
pub fn generate_entries(count: usize, value_size: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..count)
        .map(|i| (bench_key(i), random_data(value_size)))
        .collect()
}

/// Build a keyspace holding `count` entries.
pub fn populated_keyspace(count: usize, value_size: usize) -> Keyspace {
    generate_entries(count, value_size).into_iter().collect()
}

/// Open a memory-backed engine holding `count` entries.
pub fn populated_engine(count: usize, value_size: usize) -> Engine {
    let engine = Engine::with_provider("mem://bench", Arc::new(MemoryProvider::new()));
    engine
        .open(&OpenOptions::default())
        .expect("Failed to open bench engine");

    let ops = generate_entries(count, value_size)
        .into_iter()
        .map(|(key, value)| BatchOp::put(key, value))
        .collect();
    engine.batch(ops).expect("Failed to populate bench engine");
    engine
}
