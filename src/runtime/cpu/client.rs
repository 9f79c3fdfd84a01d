//! CPU client owning the worker pool

use super::config::ParallelismConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// CPU client for reductions and op dispatch
///
/// Owns a rayon pool sized once from its [`ParallelismConfig`]. Cloning is
/// cheap and shares the pool.
#[derive(Clone)]
pub struct CpuClient {
    config: ParallelismConfig,
    pool: Arc<rayon::ThreadPool>,
}

impl CpuClient {
    /// Create a client and its worker pool
    pub fn new(config: ParallelismConfig) -> Result<Self> {
        let threads = config.resolved_max_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ndexec-worker-{}", i))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build worker pool: {}", e)))?;

        tracing::debug!(
            threads,
            min_elements_per_thread = config.min_elements_per_thread,
            "cpu client ready"
        );
        Ok(Self {
            config,
            pool: Arc::new(pool),
        })
    }

    /// Create a client configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ParallelismConfig::from_env())
    }

    /// Rebuild with a different configuration
    ///
    /// Reuses the current pool when the thread ceiling is unchanged.
    pub fn with_parallelism(&self, config: ParallelismConfig) -> Result<Self> {
        if config.resolved_max_threads() == self.pool.current_num_threads() {
            return Ok(Self {
                config,
                pool: Arc::clone(&self.pool),
            });
        }
        Self::new(config)
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &ParallelismConfig {
        &self.config
    }

    /// Number of threads in the pool
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Worker count for a reduction over `total_work` elements
    #[inline]
    pub fn thread_budget(&self, total_work: usize) -> usize {
        self.config.thread_budget(total_work)
    }

    /// Run `op` inside the worker pool
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl fmt::Debug for CpuClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuClient")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
