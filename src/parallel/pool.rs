//! Rayon thread pool configuration for catalogue evaluation.
//!
//! Use [WorkerPool::install] to evaluate with a fixed number of threads, or
//! rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads are used for parallel evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If [workers](WorkerPool::workers) is 0,
    /// uses the global Rayon pool. If a dedicated pool cannot be built the
    /// closure runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                tracing::warn!(workers = self.workers, "thread pool unavailable: {err}");
                f()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedicated_pool_runs_closure() {
        let pool = WorkerPool::with_workers(2);
        let threads = pool.install(rayon::current_num_threads);
        assert_eq!(threads, 2);
        assert_eq!(WorkerPool::default().install(|| 7), 7);
    }
}
