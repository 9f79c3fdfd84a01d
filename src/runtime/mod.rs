//! Runtime backends
//!
//! Only the CPU backend exists. Any other backend must provide the same
//! contract: a client owning its execution resources, deterministic
//! partitioning of an iteration space, and a reduction engine that merges
//! partial results in a fixed order.

pub mod cpu;
