//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{Add, Mul};

/// Trait for types that can be elements of an array
///
/// This trait connects Rust's type system to the runtime dtype tag. Widening
/// reductions accumulate through `to_f64`/`from_f64`; integer-preserving ones
/// use [`IntElement`], and conversions go through [`cast`].
///
/// # Bounds
/// - `Pod + Zeroable` - storage is a word buffer viewed through bytemuck
/// - `PartialOrd` - comparison for min/max
///
/// Note: bool is not `Pod`; boolean arrays are stored as one byte per element
/// and are not dispatched to numeric kernels.
pub trait Element:
    Copy
    + Send
    + Sync
    + Debug
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Mul<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type (saturating for integers)
    fn from_f64(v: f64) -> Self;

    /// Exact integer value, `None` for floating point types
    fn to_i128(self) -> Option<i128>;

    /// Convert from an integer with `as` semantics (wrapping for integers)
    fn from_i128(v: i128) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

macro_rules! impl_element_float {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }

                #[inline]
                fn to_i128(self) -> Option<i128> {
                    None
                }

                #[inline]
                fn from_i128(v: i128) -> Self {
                    v as $ty
                }

                #[inline]
                fn zero() -> Self {
                    0.0
                }

                #[inline]
                fn one() -> Self {
                    1.0
                }
            }
        )*
    };
}

macro_rules! impl_element_int {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                // `as` from f64 saturates and maps NaN to 0
                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }

                #[inline]
                fn to_i128(self) -> Option<i128> {
                    Some(self as i128)
                }

                #[inline]
                fn from_i128(v: i128) -> Self {
                    v as $ty
                }

                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn one() -> Self {
                    1
                }
            }
        )*
    };
}

impl_element_float!(f64 => F64, f32 => F32);

impl_element_int!(
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
);

#[cfg(feature = "f16")]
impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn to_f64(self) -> f64 {
        half::f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        half::f16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        half::f16::ZERO
    }

    #[inline]
    fn one() -> Self {
        half::f16::ONE
    }
}

#[cfg(feature = "f16")]
impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn to_f64(self) -> f64 {
        half::bf16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        half::bf16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        half::bf16::ZERO
    }

    #[inline]
    fn one() -> Self {
        half::bf16::ONE
    }
}

/// Convert one element with `as` semantics
///
/// Integer sources convert exactly between integer types (wrapping when the
/// target is narrower) instead of passing through `f64`.
#[inline]
pub fn cast<I: Element, O: Element>(value: I) -> O {
    match value.to_i128() {
        Some(v) => O::from_i128(v),
        None => O::from_f64(value.to_f64()),
    }
}

/// Integer element with native, overflow-wrapping arithmetic
pub trait IntElement: Element + Ord {
    /// Smallest value
    const LOWEST: Self;
    /// Largest value
    const HIGHEST: Self;

    /// Two's complement addition
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Two's complement multiplication
    fn wrapping_mul(self, rhs: Self) -> Self;

    /// Absolute value; `MIN` of a signed type saturates to `MAX`
    fn magnitude(self) -> Self;
}

macro_rules! impl_int_element {
    ($($ty:ty => |$v:ident| $abs:expr),* $(,)?) => {
        $(
            impl IntElement for $ty {
                const LOWEST: Self = <$ty>::MIN;
                const HIGHEST: Self = <$ty>::MAX;

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$ty>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$ty>::wrapping_mul(self, rhs)
                }

                #[inline]
                fn magnitude(self) -> Self {
                    let $v = self;
                    $abs
                }
            }
        )*
    };
}

impl_int_element!(
    i64 => |v| v.saturating_abs(),
    i32 => |v| v.saturating_abs(),
    i16 => |v| v.saturating_abs(),
    i8 => |v| v.saturating_abs(),
    u64 => |v| v,
    u32 => |v| v,
    u16 => |v| v,
    u8 => |v| v,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtype() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_element_conversions() {
        assert_eq!(f32::from_f64(2.5).to_f64(), 2.5f32 as f64);
        assert_eq!(i32::from_f64(42.0), 42);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(i64::from_f64(f64::NEG_INFINITY), i64::MIN);
    }

    #[test]
    fn test_cast_keeps_integers_exact() {
        let big = (1u64 << 53) + 1;
        assert_eq!(cast::<u64, i64>(big), 9_007_199_254_740_993);
        assert_eq!(cast::<i64, u64>(i64::MAX - 1), 9_223_372_036_854_775_806);
        assert_eq!(cast::<i32, u8>(300), 44);
        assert_eq!(cast::<u64, f64>(big), 9_007_199_254_740_992.0);
        assert_eq!(cast::<f64, i64>(-2.7), -2);
        assert_eq!(cast::<f32, u8>(-1.0), 0);
    }

    #[test]
    fn test_int_element_arithmetic() {
        assert_eq!(IntElement::wrapping_add(i8::MAX, 1), i8::MIN);
        assert_eq!(IntElement::wrapping_mul(200u8, 2), 144);
        assert_eq!(i16::MIN.magnitude(), i16::MAX);
        assert_eq!((-5i64).magnitude(), 5);
        assert_eq!(7u32.magnitude(), 7);
        assert_eq!(<u16 as IntElement>::LOWEST, 0);
    }
}
