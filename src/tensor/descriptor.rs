//! ShapeDescriptor: rank, extents, strides, order, element-wise stride and dtype

use super::dims::{MAX_RANK, Shape, Strides};
use crate::dtype::DType;
use crate::error::{Error, Result};
use std::fmt;

/// Memory order of an array's logical traversal
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// C order: the last axis varies fastest
    #[default]
    RowMajor,
    /// Fortran order: the first axis varies fastest
    ColumnMajor,
}

impl Order {
    /// Single-character tag ('c' or 'f')
    pub const fn as_char(self) -> char {
        match self {
            Self::RowMajor => 'c',
            Self::ColumnMajor => 'f',
        }
    }
}

/// Immutable description of an array's layout, independent of its buffer
///
/// Offset of the element at coordinates `[c0, c1, ..., cn]`:
///   `c0 * strides[0] + c1 * strides[1] + ... + cn * strides[n]`
///
/// The logical order of elements (what "the i-th element" means) follows
/// [`Order`]. When the whole array is reachable with one uniform stride in
/// that order, [`element_wise_stride`](Self::element_wise_stride) returns it
/// and offsets are `i * ews`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShapeDescriptor {
    shape: Shape,
    strides: Strides,
    order: Order,
    ews: Option<usize>,
    dtype: DType,
}

impl ShapeDescriptor {
    /// Create a contiguous row-major descriptor
    ///
    /// # Example
    /// ```
    /// use ndexec::dtype::DType;
    /// use ndexec::tensor::ShapeDescriptor;
    /// let d = ShapeDescriptor::contiguous(&[2, 3, 4], DType::F32);
    /// assert_eq!(d.strides(), &[12, 4, 1]);
    /// assert_eq!(d.element_wise_stride(), Some(1));
    /// ```
    pub fn contiguous(extents: &[usize], dtype: DType) -> Self {
        Self::contiguous_with_order(extents, Order::RowMajor, dtype)
    }

    /// Create a contiguous descriptor in the given order
    pub fn contiguous_with_order(extents: &[usize], order: Order, dtype: DType) -> Self {
        debug_assert!(extents.len() <= MAX_RANK);
        let shape: Shape = extents.into();
        let strides = contiguous_strides(&shape, order);
        let ews = compute_ews(&shape, &strides, order);
        Self {
            shape,
            strides,
            order,
            ews,
            dtype,
        }
    }

    /// Create a descriptor with explicit strides
    ///
    /// Fails with an invalid-shape error when the rank exceeds [`MAX_RANK`],
    /// strides and extents differ in length, or either the addressed span or
    /// the element count overflows `usize`.
    pub fn new(extents: &[usize], strides: &[usize], order: Order, dtype: DType) -> Result<Self> {
        if extents.len() > MAX_RANK {
            return Err(Error::invalid_shape(format!(
                "rank {} exceeds maximum rank {}",
                extents.len(),
                MAX_RANK
            )));
        }
        if extents.len() != strides.len() {
            return Err(Error::invalid_shape(format!(
                "{} extents but {} strides",
                extents.len(),
                strides.len()
            )));
        }
        checked_span(extents, strides).ok_or_else(|| {
            Error::invalid_shape(format!(
                "extents {:?} with strides {:?} overflow the address space",
                extents, strides
            ))
        })?;
        checked_len(extents).ok_or_else(|| too_many_elements(extents))?;

        let shape: Shape = extents.into();
        let strides: Strides = strides.into();
        let ews = compute_ews(&shape, &strides, order);
        Ok(Self {
            shape,
            strides,
            order,
            ews,
            dtype,
        })
    }

    /// Create a scalar (rank-0) descriptor
    pub fn scalar(dtype: DType) -> Self {
        Self::contiguous(&[], dtype)
    }

    /// Same layout with a different dtype
    pub fn with_dtype(&self, dtype: DType) -> Self {
        Self {
            dtype,
            ..self.clone()
        }
    }

    /// Per-axis extents
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis strides (in elements)
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of axes
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Memory order tag
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Element type tag
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Uniform stride of the logical traversal, `None` when full indexing is needed
    #[inline]
    pub fn element_wise_stride(&self) -> Option<usize> {
        self.ews
    }

    /// Total number of elements (product of extents)
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the array holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for rank-0 descriptors
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// True when element `i` lives at physical offset `i`
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.ews == Some(1)
    }

    /// Number of buffer elements needed to hold every addressed offset
    pub fn required_len(&self) -> usize {
        checked_span(&self.shape, &self.strides).unwrap_or(usize::MAX)
    }

    /// Swap two axes without moving data
    pub fn transpose(&self, axis0: usize, axis1: usize) -> Result<Self> {
        let rank = self.rank();
        for axis in [axis0, axis1] {
            if axis >= rank {
                return Err(Error::InvalidDimension { dim: axis, ndim: rank });
            }
        }

        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.swap(axis0, axis1);
        strides.swap(axis0, axis1);
        let ews = compute_ews(&shape, &strides, self.order);

        Ok(Self {
            shape,
            strides,
            order: self.order,
            ews,
            dtype: self.dtype,
        })
    }

    /// Broadcast to a larger shape using zero strides
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        if target.len() < self.rank() {
            return Err(Error::shape_mismatch(target, self.shape()));
        }
        checked_len(target).ok_or_else(|| too_many_elements(target))?;

        let mut shape = Shape::with_capacity(target.len());
        let mut strides = Strides::with_capacity(target.len());

        let pad = target.len() - self.rank();
        for &t in &target[..pad] {
            shape.push(t);
            strides.push(0);
        }

        for ((&s, &st), &t) in self
            .shape
            .iter()
            .zip(self.strides.iter())
            .zip(&target[pad..])
        {
            if s == t {
                shape.push(t);
                strides.push(st);
            } else if s == 1 {
                shape.push(t);
                strides.push(0);
            } else {
                return Err(Error::shape_mismatch(target, self.shape()));
            }
        }

        let ews = compute_ews(&shape, &strides, self.order);
        Ok(Self {
            shape,
            strides,
            order: self.order,
            ews,
            dtype: self.dtype,
        })
    }
}

/// Contiguous strides for `shape` in the given order
pub(crate) fn contiguous_strides(shape: &[usize], order: Order) -> Strides {
    let mut strides: Strides = std::iter::repeat(0).take(shape.len()).collect();
    let mut stride = 1usize;
    match order {
        Order::RowMajor => {
            for axis in (0..shape.len()).rev() {
                strides[axis] = stride;
                stride = stride.saturating_mul(shape[axis]);
            }
        }
        Order::ColumnMajor => {
            for axis in 0..shape.len() {
                strides[axis] = stride;
                stride = stride.saturating_mul(shape[axis]);
            }
        }
    }
    strides
}

/// Axes from fastest- to slowest-varying for the given order
pub(crate) fn axes_fastest_first(rank: usize, order: Order) -> impl Iterator<Item = usize> {
    let row_major = matches!(order, Order::RowMajor);
    (0..rank).map(move |i| if row_major { rank - 1 - i } else { i })
}

/// The element-wise stride: `Some(s)` iff every non-unit axis has stride
/// `s * (product of the extents of faster non-unit axes)`.
fn compute_ews(shape: &[usize], strides: &[usize], order: Order) -> Option<usize> {
    if matches!(checked_len(shape), Some(n) if n <= 1) {
        return Some(1);
    }

    let mut base: Option<usize> = None;
    let mut span = 1usize;
    for axis in axes_fastest_first(shape.len(), order) {
        let extent = shape[axis];
        if extent == 1 {
            continue;
        }
        let stride = strides[axis];
        match base {
            None => {
                if stride == 0 {
                    return None;
                }
                base = Some(stride);
            }
            Some(s) => {
                if stride != s.checked_mul(span)? {
                    return None;
                }
            }
        }
        span = span.checked_mul(extent)?;
    }

    base.or(Some(1))
}

fn checked_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &e| acc.checked_mul(e))
}

fn too_many_elements(extents: &[usize]) -> Error {
    Error::invalid_shape(format!(
        "extents {:?} hold more elements than usize can count",
        extents
    ))
}

/// One past the largest addressed offset, or 0 for empty arrays
fn checked_span(shape: &[usize], strides: &[usize]) -> Option<usize> {
    if shape.iter().any(|&e| e == 0) {
        return Some(0);
    }
    let mut last = 0usize;
    for (&extent, &stride) in shape.iter().zip(strides) {
        last = last.checked_add((extent - 1).checked_mul(stride)?)?;
    }
    last.checked_add(1)
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShapeDescriptor {{ shape: {:?}, strides: {:?}, order: '{}', ews: {:?}, dtype: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.order.as_char(),
            self.ews,
            self.dtype
        )
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}
