//! Inline small-vector types for per-axis extents and strides

use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Deref, DerefMut};

/// Stack allocation threshold for dimensions
/// Most arrays have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Maximum supported rank
pub const MAX_RANK: usize = 32;

macro_rules! dim_vec {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(SmallVec<[usize; STACK_DIMS]>);

        impl $name {
            /// Create an empty vector.
            pub fn new() -> Self {
                Self(SmallVec::new())
            }

            /// Create an empty vector with capacity.
            pub fn with_capacity(capacity: usize) -> Self {
                Self(SmallVec::with_capacity(capacity))
            }

            /// Push an entry for the next axis.
            pub fn push(&mut self, value: usize) {
                self.0.push(value);
            }

            /// View as a slice.
            pub fn as_slice(&self) -> &[usize] {
                self.0.as_slice()
            }
        }

        impl Deref for $name {
            type Target = [usize];

            fn deref(&self) -> &Self::Target {
                self.0.as_slice()
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                self.0.as_mut_slice()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl AsRef<[usize]> for $name {
            fn as_ref(&self) -> &[usize] {
                self.0.as_slice()
            }
        }

        impl From<&[usize]> for $name {
            fn from(value: &[usize]) -> Self {
                Self(value.iter().copied().collect())
            }
        }

        impl From<Vec<usize>> for $name {
            fn from(value: Vec<usize>) -> Self {
                Self(value.into_iter().collect())
            }
        }

        impl<const N: usize> From<[usize; N]> for $name {
            fn from(value: [usize; N]) -> Self {
                Self(value.into_iter().collect())
            }
        }

        impl FromIterator<usize> for $name {
            fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
                Self(iter.into_iter().collect())
            }
        }
    };
}

dim_vec!(
    /// Extents: size along each axis
    Shape
);

dim_vec!(
    /// Strides: element offsets between consecutive elements along each axis
    ///
    /// NOTE: Strides are in ELEMENTS, not bytes. A zero stride marks a
    /// broadcast axis.
    Strides
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_and_spilled() {
        let small: Shape = [2, 3, 4].into();
        assert_eq!(small.as_slice(), &[2, 3, 4]);

        let big: Strides = (0..8).collect();
        assert_eq!(big.len(), 8);
        assert_eq!(big[7], 7);
    }

    #[test]
    fn test_debug_is_slice_like() {
        let s: Shape = vec![5, 1].into();
        assert_eq!(format!("{:?}", s), "[5, 1]");
    }
}
