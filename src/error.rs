//! Error types for ndexec

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using ndexec's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures.
///
/// Every [`Error`] variant maps onto exactly one kind; callers that only care
/// about the category (e.g. a graph executor deciding whether to report a
/// user error) branch on this instead of the full enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rank, extent or stride inconsistency
    InvalidShape,
    /// Out-of-range or duplicate axis, wrong arity, bad parameter
    InvalidArgument,
    /// No kernel for the requested opcode/type combination
    UnsupportedTypeCombination,
    /// An input does not satisfy a structural requirement of the op
    UnsupportedPrecondition,
    /// A buffer could not be obtained
    AllocationFailure,
    /// Broken internal invariant
    Internal,
}

/// Errors that can occur in ndexec operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Inconsistent shape descriptor
    #[error("Invalid shape: {reason}")]
    InvalidShape {
        /// Reason for invalidity
        reason: String,
    },

    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for array with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: usize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A specific input or output slot is missing or malformed
    #[error("Invalid input at slot {slot}: {reason}")]
    InvalidInput {
        /// Slot index
        slot: usize,
        /// Reason for invalidity
        reason: String,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType of an array does not match what the caller declared
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Declared dtype
        lhs: DType,
        /// Actual dtype
        rhs: DType,
    },

    /// The dispatcher has no kernel for this combination
    #[error("Unsupported type combination for op '{op}' (#{opcode}): {input:?} -> {output:?}")]
    UnsupportedTypeCombination {
        /// Op name
        op: &'static str,
        /// Numeric opcode
        opcode: u32,
        /// Input dtype
        input: DType,
        /// Output dtype
        output: DType,
    },

    /// Structural requirement on an input not met (e.g. vector expected)
    #[error("Unsupported precondition at slot {slot}: {reason}")]
    UnsupportedPrecondition {
        /// Slot index
        slot: usize,
        /// Reason
        reason: String,
    },

    /// Opcode was never registered
    #[error("Unknown opcode #{opcode}")]
    UnknownOp {
        /// Numeric opcode
        opcode: u32,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create an invalid input error for a slot
    pub fn invalid_input(slot: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            slot,
            reason: reason.into(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an unsupported precondition error for a slot
    pub fn unsupported_precondition(slot: usize, reason: impl Into<String>) -> Self {
        Self::UnsupportedPrecondition {
            slot,
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShape { .. } | Self::ShapeMismatch { .. } => ErrorKind::InvalidShape,
            Self::InvalidDimension { .. }
            | Self::InvalidArgument { .. }
            | Self::InvalidInput { .. }
            | Self::DTypeMismatch { .. }
            | Self::UnknownOp { .. } => ErrorKind::InvalidArgument,
            Self::UnsupportedDType { .. } | Self::UnsupportedTypeCombination { .. } => {
                ErrorKind::UnsupportedTypeCombination
            }
            Self::UnsupportedPrecondition { .. } => ErrorKind::UnsupportedPrecondition,
            Self::OutOfMemory { .. } => ErrorKind::AllocationFailure,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Input slot the failure refers to, if any
    pub fn slot(&self) -> Option<usize> {
        match self {
            Self::InvalidInput { slot, .. } | Self::UnsupportedPrecondition { slot, .. } => {
                Some(*slot)
            }
            _ => None,
        }
    }
}
