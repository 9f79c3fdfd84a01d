//! Reduction catalogue
//!
//! Each [`ReduceOp`] is a pluggable [`ReduceStrategy`]. [`OpStrategy`]
//! accumulates in `f64`; [`NativeStrategy`] keeps integer reductions whose
//! output type is the input type in that integer type. The engine in
//! [`crate::runtime::cpu::reduce`] is shared by all of them.

use crate::dtype::{DType, DTypeSet, Element, IntElement};
use crate::error::{Error, Result};
use crate::runtime::cpu::ReduceStrategy;
use std::marker::PhantomData;

/// Reduction operation kind
///
/// Discriminants are the stable opcodes used by the dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ReduceOp {
    /// Sum of elements
    Sum = 0,
    /// Mean of elements
    Mean = 1,
    /// Maximum element
    Max = 2,
    /// Minimum element
    Min = 3,
    /// Product of elements
    Prod = 4,
    /// Mean of absolute values
    AMean = 5,
    /// Largest absolute value
    AMax = 6,
    /// Smallest absolute value
    AMin = 7,
    /// Sum of absolute values
    Norm1 = 8,
    /// Euclidean norm
    Norm2 = 9,
    /// Maximum norm
    NormMax = 10,
    /// Sum of squares
    SquaredNorm = 11,
    /// Number of non-zero elements
    CountNonZero = 12,
}

/// Which output types a reduction accepts
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputRule {
    /// Output dtype equals input dtype
    SameAsInput,
    /// Any floating point output
    Floats,
    /// Any integer output
    Ints,
}

impl ReduceOp {
    /// Every reduction, in opcode order
    pub const ALL: [ReduceOp; 13] = [
        ReduceOp::Sum,
        ReduceOp::Mean,
        ReduceOp::Max,
        ReduceOp::Min,
        ReduceOp::Prod,
        ReduceOp::AMean,
        ReduceOp::AMax,
        ReduceOp::AMin,
        ReduceOp::Norm1,
        ReduceOp::Norm2,
        ReduceOp::NormMax,
        ReduceOp::SquaredNorm,
        ReduceOp::CountNonZero,
    ];

    /// Stable opcode
    #[inline]
    pub const fn opcode(self) -> u32 {
        self as u32
    }

    /// Look up a reduction by opcode
    pub fn from_opcode(opcode: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.opcode() == opcode)
    }

    /// Registered op name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "reduce_sum",
            Self::Mean => "reduce_mean",
            Self::Max => "reduce_max",
            Self::Min => "reduce_min",
            Self::Prod => "reduce_prod",
            Self::AMean => "reduce_amean",
            Self::AMax => "reduce_amax",
            Self::AMin => "reduce_amin",
            Self::Norm1 => "reduce_norm1",
            Self::Norm2 => "reduce_norm2",
            Self::NormMax => "reduce_norm_max",
            Self::SquaredNorm => "reduce_sqnorm",
            Self::CountNonZero => "count_nonzero",
        }
    }

    /// Output type rule
    pub const fn output_rule(self) -> OutputRule {
        match self {
            Self::Sum | Self::Max | Self::Min | Self::Prod | Self::AMax | Self::AMin => {
                OutputRule::SameAsInput
            }
            Self::Mean
            | Self::AMean
            | Self::Norm1
            | Self::Norm2
            | Self::NormMax
            | Self::SquaredNorm => OutputRule::Floats,
            Self::CountNonZero => OutputRule::Ints,
        }
    }

    /// Allowed output dtypes
    pub const fn output_types(self) -> DTypeSet {
        match self.output_rule() {
            OutputRule::SameAsInput => DTypeSet::NUMERIC,
            OutputRule::Floats => DTypeSet::FLOATS,
            OutputRule::Ints => DTypeSet::INTS,
        }
    }

    /// Output dtype used when the caller does not request one
    pub const fn default_output(self, input: DType) -> DType {
        match self.output_rule() {
            OutputRule::SameAsInput => input,
            OutputRule::Floats if input.is_float() => input,
            OutputRule::Floats => DType::F32,
            OutputRule::Ints => DType::I64,
        }
    }

    /// Strategy reading `I` and producing `O`
    pub fn strategy<I: Element, O: Element>(self) -> OpStrategy<I, O> {
        OpStrategy {
            op: self,
            _marker: PhantomData,
        }
    }

    /// Integer strategy for reductions whose output type is the input type
    ///
    /// `None` for ops that produce a float or a count.
    pub fn native_strategy<T: IntElement>(self) -> Option<NativeStrategy<T>> {
        (self.output_rule() == OutputRule::SameAsInput).then_some(NativeStrategy {
            op: self,
            _marker: PhantomData,
        })
    }
}

impl TryFrom<u32> for ReduceOp {
    type Error = Error;

    fn try_from(opcode: u32) -> Result<Self> {
        Self::from_opcode(opcode).ok_or(Error::UnknownOp { opcode })
    }
}

/// [`ReduceStrategy`] for one [`ReduceOp`]
#[derive(Clone, Copy, Debug)]
pub struct OpStrategy<I, O> {
    op: ReduceOp,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I: Element, O: Element> ReduceStrategy<I> for OpStrategy<I, O> {
    type Acc = f64;
    type Out = O;

    #[inline]
    fn seed(&self) -> f64 {
        match self.op {
            ReduceOp::Prod => 1.0,
            ReduceOp::Max => f64::NEG_INFINITY,
            ReduceOp::Min | ReduceOp::AMin => f64::INFINITY,
            _ => 0.0,
        }
    }

    #[inline]
    fn combine(&self, acc: f64, value: I) -> f64 {
        let x = value.to_f64();
        match self.op {
            ReduceOp::Sum | ReduceOp::Mean => acc + x,
            ReduceOp::Max => acc.max(x),
            ReduceOp::Min => acc.min(x),
            ReduceOp::Prod => acc * x,
            ReduceOp::AMean | ReduceOp::Norm1 => acc + x.abs(),
            ReduceOp::AMax | ReduceOp::NormMax => acc.max(x.abs()),
            ReduceOp::AMin => acc.min(x.abs()),
            ReduceOp::Norm2 | ReduceOp::SquaredNorm => acc + x * x,
            ReduceOp::CountNonZero => acc + if x != 0.0 { 1.0 } else { 0.0 },
        }
    }

    #[inline]
    fn merge(&self, lhs: f64, rhs: f64) -> f64 {
        match self.op {
            ReduceOp::Max | ReduceOp::AMax | ReduceOp::NormMax => lhs.max(rhs),
            ReduceOp::Min | ReduceOp::AMin => lhs.min(rhs),
            ReduceOp::Prod => lhs * rhs,
            _ => lhs + rhs,
        }
    }

    #[inline]
    fn finalize(&self, acc: f64, count: usize) -> O {
        let value = match self.op {
            ReduceOp::Mean | ReduceOp::AMean => acc / count as f64,
            ReduceOp::Norm2 => acc.sqrt(),
            _ => acc,
        };
        O::from_f64(value)
    }
}

/// [`ReduceStrategy`] accumulating in the integer element type itself
///
/// Sums and products wrap on overflow. An empty `Max` yields the type's
/// minimum and an empty `Min`/`AMin` its maximum.
#[derive(Clone, Copy, Debug)]
pub struct NativeStrategy<T> {
    op: ReduceOp,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: IntElement> ReduceStrategy<T> for NativeStrategy<T> {
    type Acc = T;
    type Out = T;

    #[inline]
    fn seed(&self) -> T {
        match self.op {
            ReduceOp::Prod => T::one(),
            ReduceOp::Max => T::LOWEST,
            ReduceOp::Min | ReduceOp::AMin => T::HIGHEST,
            _ => T::zero(),
        }
    }

    #[inline]
    fn combine(&self, acc: T, value: T) -> T {
        match self.op {
            ReduceOp::Max => acc.max(value),
            ReduceOp::Min => acc.min(value),
            ReduceOp::Prod => acc.wrapping_mul(value),
            ReduceOp::AMax => acc.max(value.magnitude()),
            ReduceOp::AMin => acc.min(value.magnitude()),
            _ => acc.wrapping_add(value),
        }
    }

    #[inline]
    fn merge(&self, lhs: T, rhs: T) -> T {
        match self.op {
            ReduceOp::Max | ReduceOp::AMax => lhs.max(rhs),
            ReduceOp::Min | ReduceOp::AMin => lhs.min(rhs),
            ReduceOp::Prod => lhs.wrapping_mul(rhs),
            _ => lhs.wrapping_add(rhs),
        }
    }

    #[inline]
    fn finalize(&self, acc: T, _: usize) -> T {
        acc
    }
}

/// Compute output shape for reduction
///
/// # Arguments
/// * `input_shape` - Shape of input array
/// * `axes` - Axes to reduce over
/// * `keep_dims` - If true, keep reduced axes as size 1
pub fn reduce_output_shape(input_shape: &[usize], axes: &[usize], keep_dims: bool) -> Vec<usize> {
    if keep_dims {
        input_shape
            .iter()
            .enumerate()
            .map(|(i, &s)| if axes.contains(&i) { 1 } else { s })
            .collect()
    } else {
        input_shape
            .iter()
            .enumerate()
            .filter(|(i, _)| !axes.contains(i))
            .map(|(_, &s)| s)
            .collect()
    }
}

/// Axes a reduction runs over: `None` means every axis
pub fn resolve_axes(axes: Option<&[usize]>, rank: usize) -> Vec<usize> {
    match axes {
        Some(axes) => axes.to_vec(),
        None => (0..rank).collect(),
    }
}
