//! Bounded CPU worker pool.
//!
//! A 1536-bit exponentiation costs hundreds of milliseconds; running it on
//! the async runtime would stall every connection sharing the worker thread.
//! Work submitted here executes on the blocking thread pool, with
//! concurrency capped at the worker count and a bounded admission queue that
//! rejects further work instead of growing without limit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{Error, Result};

/// Default admission queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Handle to the shared CPU pool. Cloning is cheap and all clones share the
/// same limits.
#[derive(Clone)]
pub struct CpuPool {
    workers: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    queue_capacity: usize,
}

struct QueueSlot<'a> {
    queued: &'a AtomicUsize,
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CpuPool {
    /// Creates a pool with an explicit worker count and queue capacity.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(workers.max(1))),
            queued: Arc::new(AtomicUsize::new(0)),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Creates a pool sized to the machine: one worker per core and the
    /// default queue depth.
    pub fn with_defaults() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(workers, DEFAULT_QUEUE_CAPACITY)
    }

    /// Runs a CPU-bound task on the pool.
    ///
    /// Fails with [`Error::DependencyUnavailable`] when the admission queue
    /// is full (back-pressure) or the runtime refuses the task.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.queued.fetch_add(1, Ordering::SeqCst) >= self.queue_capacity {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::DependencyUnavailable(
                "cpu pool queue is full".to_string(),
            ));
        }
        let _slot = QueueSlot {
            queued: &self.queued,
        };

        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| Error::DependencyUnavailable("cpu pool is shut down".to_string()))?;

        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| Error::DependencyUnavailable(format!("cpu worker failed: {e}")))
    }
}
