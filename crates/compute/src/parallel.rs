//! Parallel-map strategies.
//!
//! The extraction driver and the forest fit fan work out through a
//! [`ParallelMap`], so the executor can be swapped (thread pool or plain
//! sequential loop) without touching the callers. Every implementation runs
//! `f` exactly once per item and returns results in input order.

use rayon::prelude::*;
use tracing::warn;

use scatter_core::config::resolve_jobs;

pub trait ParallelMap: Send + Sync {
    /// Apply `f` to every item, returning results positionally.
    fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send;
}

/// Runs on a dedicated rayon thread pool sized by the concurrency degree.
#[derive(Debug, Clone, Copy)]
pub struct RayonMap {
    /// Worker threads. 0 = num_cpus.
    n_jobs: usize,
}

impl RayonMap {
    pub fn new(n_jobs: usize) -> Self {
        Self { n_jobs }
    }

    pub fn threads(&self) -> usize {
        resolve_jobs(self.n_jobs)
    }
}

impl Default for RayonMap {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParallelMap for RayonMap {
    fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        let threads = self.threads();
        if threads <= 1 || items.len() <= 1 {
            return items.iter().map(f).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            Err(e) => {
                warn!(error = %e, threads, "failed to build thread pool, running sequentially");
                items.iter().map(f).collect()
            }
        }
    }
}

/// Runs on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialMap;

impl ParallelMap for SequentialMap {
    fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        items.iter().map(f).collect()
    }
}
