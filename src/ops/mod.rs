//! Operations
//!
//! This module holds the reduction catalogue and the declarable-op machinery.
//!
//! # Design
//!
//! Every operation is described once by an [`OpDescriptor`] (arity, in-place
//! eligibility, allowed dtypes, shape function) and implemented by one kernel
//! per supported `(input dtype, output dtype)` pair. The [`OpRegistry`] maps
//! `(opcode, input, output)` to a kernel in one hash lookup; the
//! [`OpDispatcher`] validates an [`OpContext`] against the descriptor and runs
//! the kernel.
//!
//! ```text
//! OpDispatcher::execute(opcode, ctx)
//!   ├── descriptor lookup       unknown opcode
//!   ├── arity / in-place check  invalid input, unsupported precondition
//!   ├── shape inference         shape_fn(inputs, params)
//!   ├── kernel lookup           unsupported type combination
//!   ├── output allocation
//!   └── kernel(client, opcode, ctx)
//! ```
//!
//! Reductions share a single engine: each [`ReduceOp`] only contributes a
//! seed/combine/merge/finalize strategy.

mod context;
pub mod declarable;
pub(crate) mod dispatch;
mod reduce;
mod registry;

pub use context::{IoPair, OpContext, OpParams};
pub use dispatch::OpDispatcher;
pub use reduce::{
    NativeStrategy, OpStrategy, OutputRule, ReduceOp, reduce_output_shape, resolve_axes,
};
pub use registry::{KernelFn, OpCode, OpDescriptor, OpRegistry, ShapeFn};

impl From<ReduceOp> for OpCode {
    fn from(op: ReduceOp) -> Self {
        OpCode(op.opcode())
    }
}
