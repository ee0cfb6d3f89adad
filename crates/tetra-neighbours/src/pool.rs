//! Fixed-size worker pool running one routine per block.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug_span;

use crate::error::Result;
use crate::partition::{partition, Block};

/// Upper bound on the number of workers.
pub const MAX_WORKERS: usize = 128;

/// Clamp a requested worker count to `[1, MAX_WORKERS]`, `0` meaning every
/// available hardware thread.
pub fn resolve_workers(requested: usize) -> usize {
    let workers = if requested == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        requested
    };
    workers.clamp(1, MAX_WORKERS)
}

/// A pool of exactly `workers` threads.
///
/// Each [`launch`](Self::launch) is a fork-join: it returns once every
/// worker's routine has finished, which is the barrier between phases.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Start a pool for `requested` workers (see [`resolve_workers`]).
    pub fn new(requested: usize) -> Result<Self> {
        let workers = resolve_workers(requested);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tetra-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Partition `count` elements into one block per worker.
    pub fn blocks(&self, count: usize) -> Vec<Block> {
        partition(count, self.workers)
    }

    /// Run `routine` once per item, in parallel, and wait for all of them.
    ///
    /// Results come back in item order. If any routine fails, one of the
    /// errors is returned.
    pub fn launch<T, R, F>(&self, name: &str, items: &mut [T], routine: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> Result<R> + Sync,
    {
        let _span = debug_span!("launch", routine = name, items = items.len()).entered();
        self.pool
            .install(|| items.par_iter_mut().map(&routine).collect())
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}
