//! Built-in declarable operations
//!
//! | opcodes     | ops                                                  |
//! |-------------|------------------------------------------------------|
//! | 0..=12      | reductions, see [`ReduceOp`](crate::ops::ReduceOp)   |
//! | 1000..=1002 | `to_int64`, `to_float32`, `to_float64`               |
//! | 1003        | `assign`                                             |

mod reduce;
mod transform;

pub use transform::{ASSIGN, TO_FLOAT32, TO_FLOAT64, TO_INT64};

use super::registry::OpRegistry;

/// Register every built-in op and its kernels
pub(crate) fn register_defaults(registry: &mut OpRegistry) {
    reduce::register(registry);
    transform::register(registry);
}
