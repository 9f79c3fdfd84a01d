//! Parallelism configuration for the CPU runtime

use std::num::NonZeroUsize;

/// Environment variable overriding the thread ceiling
pub const ENV_NUM_THREADS: &str = "NDEXEC_NUM_THREADS";

/// Environment variable overriding the per-thread work floor
pub const ENV_MIN_ELEMENTS_PER_THREAD: &str = "NDEXEC_MIN_ELEMENTS_PER_THREAD";

/// Default minimum number of elements a worker is given
pub const DEFAULT_MIN_ELEMENTS_PER_THREAD: usize = 4096;

/// How many workers a reduction may use
///
/// `max_threads = None` means "use the hardware concurrency". A reduction over
/// `n` elements never uses more than `ceil(n / min_elements_per_thread)`
/// workers, so small inputs stay on one thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelismConfig {
    /// Upper bound on worker threads
    pub max_threads: Option<usize>,
    /// Minimum number of elements handed to each worker
    pub min_elements_per_thread: usize,
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            min_elements_per_thread: DEFAULT_MIN_ELEMENTS_PER_THREAD,
        }
    }
}

impl ParallelismConfig {
    /// Build a config; `None` keeps the default for that field
    pub fn new(max_threads: Option<usize>, min_elements_per_thread: Option<usize>) -> Self {
        let defaults = Self::default();
        Self {
            max_threads: max_threads.or(defaults.max_threads),
            min_elements_per_thread: min_elements_per_thread
                .unwrap_or(defaults.min_elements_per_thread),
        }
    }

    /// Config that always uses exactly one worker
    pub fn single_threaded() -> Self {
        Self {
            max_threads: Some(1),
            ..Self::default()
        }
    }

    /// Read overrides from `NDEXEC_NUM_THREADS` and `NDEXEC_MIN_ELEMENTS_PER_THREAD`
    ///
    /// Values that are missing, unparsable or zero fall back to the default.
    pub fn from_env() -> Self {
        Self::new(
            read_env(ENV_NUM_THREADS),
            read_env(ENV_MIN_ELEMENTS_PER_THREAD),
        )
    }

    /// Thread ceiling: the configured maximum capped by the hardware concurrency
    pub fn resolved_max_threads(&self) -> usize {
        let hardware = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        match self.max_threads {
            Some(n) => n.clamp(1, hardware),
            None => hardware,
        }
    }

    /// Worker count for `total_work` elements
    ///
    /// Clamped to `[1, ceiling]` where the ceiling is the smaller of the
    /// configured maximum and `ceil(total_work / min_elements_per_thread)`.
    pub fn thread_budget(&self, total_work: usize) -> usize {
        let floor = self.min_elements_per_thread.max(1);
        let by_work = total_work.div_ceil(floor).max(1);
        self.resolved_max_threads().min(by_work).max(1)
    }
}

fn read_env(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid parallelism override");
            None
        }
        Ok(n) => Some(n),
    }
}
