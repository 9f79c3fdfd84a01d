//! # ndexec
//!
//! **Native execution core for dense n-dimensional arrays.**
//!
//! ndexec provides the machinery every array kernel sits on: layout
//! descriptors and strided indexing, tensor-along-dimension (TAD)
//! decomposition, deterministic work partitioning, a parallel reduction engine
//! parametrised by small strategies, and an opcode/dtype dispatcher for
//! declarable operations.
//!
//! ## Features
//!
//! - **Layouts**: row- and column-major descriptors with arbitrary strides,
//!   broadcast axes and an O(1) element-wise-stride fast path
//! - **TAD**: split an array into independent slices along any axis set
//! - **Reductions**: one engine for sum, mean, max, norms and friends, merged
//!   in a fixed order so results are reproducible per thread budget
//! - **Dispatch**: `(opcode, input dtype, output dtype)` kernel lookup with
//!   shape inference, in-place execution and fail-fast validation
//!
//! ## Quick Start
//!
//! ```
//! use ndexec::prelude::*;
//!
//! # fn main() -> ndexec::error::Result<()> {
//! let client = CpuClient::new(ParallelismConfig::default())?;
//! let registry = OpRegistry::with_defaults();
//! let dispatcher = OpDispatcher::new(&registry, &client);
//!
//! let a = NdArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
//! let mut ctx = OpContext::new(vec![a]).with_params(OpParams::new().with_axes([1]));
//! dispatcher.execute(ReduceOp::Sum.into(), &mut ctx)?;
//!
//! assert_eq!(ctx.output(0)?.to_vec::<f32>()?, vec![6.0, 15.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `f16`: Half-precision floats (F16, BF16)
//!
//! ## Configuration
//!
//! `NDEXEC_NUM_THREADS` and `NDEXEC_MIN_ELEMENTS_PER_THREAD` are read by
//! [`ParallelismConfig::from_env`](runtime::cpu::ParallelismConfig::from_env).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod bench;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

#[cfg(test)]
mod property_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, DTypeSet, Element};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::ops::{OpCode, OpContext, OpDispatcher, OpParams, OpRegistry, ReduceOp};
    pub use crate::runtime::cpu::{CpuClient, ParallelismConfig};
    pub use crate::tensor::{NdArray, Order, ShapeDescriptor, ShapeIndexer};
}

#[doc(hidden)]
pub mod __private {
    #[cfg(feature = "f16")]
    pub use half;
}
