//! Serialized persistence of the keyspace.
//!
//! Every committed mutation submits one job. Jobs run one at a time, in
//! submission order, on a dedicated worker thread, so physical writes never
//! overlap. A job serializes the keyspace as it is when the job runs, which
//! means several back-to-back mutations may land in the same payload.
//!
//! The pending counter covers queued and in-flight jobs. Draining waits on
//! a condition variable until it reaches zero.

use crate::error::{StoreError, StoreResult};
use crate::types::WriteStats;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A unit of persistence work.
pub type WriteJob = Box<dyn FnOnce() -> StoreResult<()> + Send + 'static>;

struct Envelope {
    job: WriteJob,
    done: SyncSender<StoreResult<()>>,
}

#[derive(Default)]
struct Shared {
    pending: Mutex<usize>,
    idle: Condvar,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// Runs write jobs one at a time on a worker thread.
pub struct WriteSerializer {
    sender: Option<Sender<Envelope>>,
    worker: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl WriteSerializer {
    /// Starts the worker thread.
    pub fn spawn() -> StoreResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name("vaultkv-writer".to_string())
            .spawn(move || run(&receiver, &worker_shared))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            shared,
        })
    }

    /// Queues a job behind every job submitted before it.
    pub fn submit(&self, job: WriteJob) -> PendingWrite {
        let (done, result) = mpsc::sync_channel(1);
        *self.shared.pending.lock() += 1;

        let sent = match &self.sender {
            Some(sender) => sender.send(Envelope { job, done }).is_ok(),
            None => false,
        };
        if !sent {
            self.shared.finish_one();
            return PendingWrite::failed(StoreError::write("write serializer has stopped"));
        }
        PendingWrite { result }
    }

    /// Number of queued and in-flight jobs.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Returns the job counters.
    #[must_use]
    pub fn stats(&self) -> WriteStats {
        WriteStats {
            completed: self.shared.completed.load(Ordering::Acquire),
            failed: self.shared.failed.load(Ordering::Acquire),
            pending: self.pending(),
        }
    }

    /// Blocks until no job is queued or in flight.
    pub fn drain(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }

    /// Drains the queue and stops the worker thread.
    pub fn shutdown(mut self) {
        self.drain();
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender ends the worker's receive loop
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("write serializer thread panicked");
            }
        }
    }
}

impl Drop for WriteSerializer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WriteSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteSerializer")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn run(receiver: &Receiver<Envelope>, shared: &Shared) {
    for Envelope { job, done } in receiver {
        let result = panic::catch_unwind(AssertUnwindSafe(job))
            .unwrap_or_else(|_| Err(StoreError::write("write job panicked")));

        match &result {
            Ok(()) => {
                shared.completed.fetch_add(1, Ordering::AcqRel);
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::AcqRel);
                tracing::warn!(error = %e, "failed to persist keyspace");
            }
        }

        shared.finish_one();
        // The submitter may have dropped its handle
        let _ = done.send(result);
    }
}

/// Completion handle for a submitted write.
#[derive(Debug)]
#[must_use = "a pending write does nothing unless waited on or dropped deliberately"]
pub struct PendingWrite {
    result: Receiver<StoreResult<()>>,
}

impl PendingWrite {
    fn failed(error: StoreError) -> Self {
        let (done, result) = mpsc::sync_channel(1);
        let _ = done.send(Err(error));
        Self { result }
    }

    /// Blocks until the write has finished and returns its outcome.
    pub fn wait(self) -> StoreResult<()> {
        self.result
            .recv()
            .unwrap_or_else(|_| Err(StoreError::write("write job was dropped")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn runs_jobs_in_order() {
        let serializer = WriteSerializer::spawn().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let log = Arc::clone(&log);
                serializer.submit(Box::new(move || {
                    log.lock().push(i);
                    Ok(())
                }))
            })
            .collect();

        for handle in handles {
            handle.wait().unwrap();
        }
        assert_eq!(*log.lock(), (0..20).collect::<Vec<_>>());
        assert_eq!(serializer.stats().completed, 20);
    }

    #[test]
    fn jobs_never_overlap() {
        let serializer = WriteSerializer::spawn().unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            let _pending = serializer.submit(Box::new(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        serializer.drain();
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(serializer.pending(), 0);
    }

    #[test]
    fn drain_waits_for_slow_jobs() {
        let serializer = WriteSerializer::spawn().unwrap();
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let finished = Arc::clone(&finished);
            let _pending = serializer.submit(Box::new(move || {
                thread::sleep(Duration::from_millis(5));
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        serializer.drain();
        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn failures_reach_the_submitter() {
        let serializer = WriteSerializer::spawn().unwrap();

        let failing = serializer.submit(Box::new(|| Err(StoreError::write("disk full"))));
        let ok = serializer.submit(Box::new(|| Ok(())));

        assert!(matches!(failing.wait(), Err(StoreError::Write { .. })));
        ok.wait().unwrap();

        let stats = serializer.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn panicking_job_does_not_stall_queue() {
        let serializer = WriteSerializer::spawn().unwrap();

        let panicking = serializer.submit(Box::new(|| panic!("boom")));
        assert!(panicking.wait().is_err());

        serializer.submit(Box::new(|| Ok(()))).wait().unwrap();
        serializer.drain();
    }

    #[test]
    fn shutdown_after_drain() {
        let serializer = WriteSerializer::spawn().unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);
        let pending = serializer.submit(Box::new(move || {
            thread::sleep(Duration::from_millis(10));
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        serializer.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        pending.wait().unwrap();
    }
}
