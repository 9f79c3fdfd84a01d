//! Tensor-along-dimension decomposition
//!
//! Splitting a reduction over a subset of axes into independent slices. Each
//! slice spans the reduced axes; one slice exists per coordinate of the kept
//! axes, and slices are enumerated row-major over the kept axes so that slice
//! `k` produces output element `k`.
//!
//! ```text
//! shape [2, 3], strides [3, 1], reduce over axis 1
//!
//!   slice 0: base 0  ->  offsets 0 1 2
//!   slice 1: base 3  ->  offsets 3 4 5
//! ```

use super::descriptor::{Order, ShapeDescriptor};
use super::dims::Shape;
use super::index::ShapeIndexer;
use crate::error::{Error, Result};

/// Geometry of a non-degenerate reduction along axes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TadSlice {
    descriptor: ShapeDescriptor,
    offsets: Vec<usize>,
    kept: Shape,
}

impl TadSlice {
    /// Descriptor of one slice (reduced axes, original strides and order)
    #[inline]
    pub fn descriptor(&self) -> &ShapeDescriptor {
        &self.descriptor
    }

    /// Base offset of every slice, in output order
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of slices
    #[inline]
    pub fn num_slices(&self) -> usize {
        self.offsets.len()
    }

    /// Elements per slice
    #[inline]
    pub fn slice_len(&self) -> usize {
        self.descriptor.len()
    }

    /// Extents of the kept axes, i.e. the shape of the reduction result
    #[inline]
    pub fn kept_shape(&self) -> &[usize] {
        &self.kept
    }
}

/// Result of [`decompose`]
///
/// The two degenerate forms are never materialised as slice lists; callers
/// must branch on them before iterating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TadPack {
    /// No axes requested: nothing is reduced, every element stands alone
    Passthrough,
    /// Every axis requested: one scalar over the whole array
    Full,
    /// Regular decomposition into slices
    Slices(TadSlice),
}

impl TadPack {
    /// True for [`TadPack::Passthrough`] and [`TadPack::Full`]
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, Self::Slices(_))
    }
}

/// Validate a set of axes against `rank`
///
/// Out-of-range axes report [`Error::InvalidDimension`], repeated axes an
/// invalid argument. Returns a per-axis mask of the requested axes.
pub fn validate_axes(axes: &[usize], rank: usize) -> Result<Vec<bool>> {
    let mut mask = vec![false; rank];
    for &axis in axes {
        if axis >= rank {
            return Err(Error::InvalidDimension { dim: axis, ndim: rank });
        }
        if mask[axis] {
            return Err(Error::invalid_argument(
                "axes",
                format!("axis {} appears more than once", axis),
            ));
        }
        mask[axis] = true;
    }
    Ok(mask)
}

/// Decompose `descriptor` into slices spanning `axes`
///
/// # Example
///
/// ```
/// use ndexec::dtype::DType;
/// use ndexec::tensor::{decompose, ShapeDescriptor, TadPack};
///
/// let d = ShapeDescriptor::contiguous(&[2, 3], DType::F32);
/// let TadPack::Slices(tad) = decompose(&d, &[0])? else { unreachable!() };
/// assert_eq!(tad.offsets(), &[0, 1, 2]);
/// assert_eq!(tad.descriptor().shape(), &[2]);
/// assert_eq!(tad.descriptor().strides(), &[3]);
/// # Ok::<(), ndexec::error::Error>(())
/// ```
pub fn decompose(descriptor: &ShapeDescriptor, axes: &[usize]) -> Result<TadPack> {
    let rank = descriptor.rank();
    let mask = validate_axes(axes, rank)?;

    if axes.is_empty() {
        return Ok(TadPack::Passthrough);
    }
    if axes.len() == rank {
        return Ok(TadPack::Full);
    }

    let shape = descriptor.shape();
    let strides = descriptor.strides();

    let mut reduced_extents = Vec::with_capacity(axes.len());
    let mut reduced_strides = Vec::with_capacity(axes.len());
    let mut kept_extents = Vec::with_capacity(rank - axes.len());
    let mut kept_strides = Vec::with_capacity(rank - axes.len());
    for axis in 0..rank {
        if mask[axis] {
            reduced_extents.push(shape[axis]);
            reduced_strides.push(strides[axis]);
        } else {
            kept_extents.push(shape[axis]);
            kept_strides.push(strides[axis]);
        }
    }

    let slice = ShapeDescriptor::new(
        &reduced_extents,
        &reduced_strides,
        descriptor.order(),
        descriptor.dtype(),
    )?;

    // The output is always laid out row-major over the kept axes
    let outer = ShapeDescriptor::new(
        &kept_extents,
        &kept_strides,
        Order::RowMajor,
        descriptor.dtype(),
    )?;
    let indexer = ShapeIndexer::new(&outer);
    let offsets: Vec<usize> = indexer.cursor(0, indexer.len()).collect();

    tracing::trace!(
        shape = ?shape,
        axes = ?axes,
        slices = offsets.len(),
        slice_len = slice.len(),
        "decomposed along axes"
    );

    Ok(TadPack::Slices(TadSlice {
        descriptor: slice,
        offsets,
        kept: kept_extents.into(),
    }))
}
