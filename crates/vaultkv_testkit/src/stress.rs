//! Stress helpers for VaultKV.
//!
//! These drive an engine under heavy load and concurrent access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vaultkv_core::{Engine, ReadOptions};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of each value in bytes.
    pub value_size: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            value_size: 64,
            key_count: 100,
        }
    }
}

fn stress_key(i: usize, key_count: usize) -> Vec<u8> {
    format!("stress-{:05}", i % key_count.max(1)).into_bytes()
}

/// Runs puts from several threads at once.
pub fn stress_concurrent_writes(engine: Arc<Engine>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let value = vec![b'a' + (t % 26) as u8; config.value_size];
            let key_count = config.key_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = stress_key(t * ops_per_thread + i, key_count);
                    match engine.put(&key, Some(value.as_slice())) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Runs reads from several threads while one thread keeps writing.
pub fn stress_readers_with_writer(engine: Arc<Engine>, config: &StressConfig) -> StressTestResult {
    let value = vec![b'x'; config.value_size];
    for i in 0..config.key_count {
        engine
            .put(&stress_key(i, config.key_count), Some(value.as_slice()))
            .expect("Failed to seed store");
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let writer = {
        let engine = Arc::clone(&engine);
        let key_count = config.key_count;
        let value = value.clone();
        thread::spawn(move || {
            for i in 0..ops_per_thread {
                let _ = engine.put(&stress_key(i, key_count), Some(value.as_slice()));
            }
        })
    };

    let readers: Vec<_> = (0..config.threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let key_count = config.key_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = stress_key(t + i, key_count);
                    match engine.get(&key, &ReadOptions::default()) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().expect("Reader thread panicked");
    }
    writer.join().expect("Writer thread panicked");

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
