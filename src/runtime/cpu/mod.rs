//! CPU runtime
//!
//! Worker-pool ownership, iteration-space partitioning and the parallel
//! reduction engine shared by every reduction kernel.
//!
//! # Thread budget
//!
//! A reduction over `n` elements uses
//! `clamp(min(max_threads, hardware), 1, ceil(n / min_elements_per_thread))`
//! workers unless the caller overrides the budget for that call. The merge
//! order of partial results is fixed by range index, so a given budget always
//! produces bit-identical results.

mod client;
mod config;
mod partition;
pub mod reduce;

pub use client::CpuClient;
pub use config::{
    DEFAULT_MIN_ELEMENTS_PER_THREAD, ENV_MIN_ELEMENTS_PER_THREAD, ENV_NUM_THREADS,
    ParallelismConfig,
};
pub use partition::{WorkRange, partition};
pub use reduce::{
    ElementView, FnStrategy, ReduceStrategy, ReductionJob, run_scalar_reduction,
    run_tad_reduction,
};
