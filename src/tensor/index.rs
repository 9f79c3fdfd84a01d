//! Shape-driven index engine
//!
//! Maps a logical element index to a physical offset for arbitrary rank and
//! strides. Callers that visit many elements build one [`ShapeIndexer`] per
//! call: it holds the narrowed extent table, so per-element decomposition
//! runs on 32-bit division whenever the shape allows it.
//!
//! These helpers assume an already-validated descriptor; bounds are only
//! checked with `debug_assert!`.

use super::descriptor::{ShapeDescriptor, axes_fastest_first};
use smallvec::SmallVec;

type AxisVec<T> = SmallVec<[T; 4]>;

/// Total number of elements described by `descriptor`
#[inline]
pub fn total_elements(descriptor: &ShapeDescriptor) -> usize {
    descriptor.len()
}

/// True when logical index `i` maps to physical offset `i`
#[inline]
pub fn is_contiguous(descriptor: &ShapeDescriptor) -> bool {
    descriptor.is_contiguous()
}

/// Physical offset of logical element `index`
///
/// O(1) when the descriptor has an element-wise stride; otherwise a full
/// per-axis decomposition. Loops should prefer [`ShapeIndexer`].
#[inline]
pub fn offset_of(descriptor: &ShapeDescriptor, index: usize) -> usize {
    debug_assert!(index < descriptor.len().max(1));
    match descriptor.element_wise_stride() {
        Some(ews) => index * ews,
        None => decompose_wide(descriptor, index),
    }
}

fn decompose_wide(descriptor: &ShapeDescriptor, mut index: usize) -> usize {
    let shape = descriptor.shape();
    let strides = descriptor.strides();
    let mut offset = 0usize;
    for axis in axes_fastest_first(shape.len(), descriptor.order()) {
        let extent = shape[axis];
        offset += (index % extent) * strides[axis];
        index /= extent;
    }
    offset
}

/// Extents narrowed to `u32`, precomputed once per shape
///
/// The table is usable only when every extent and the element count fit in
/// 32 bits; otherwise decomposition falls back to 64-bit arithmetic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastTable {
    extents: AxisVec<u32>,
    narrow: bool,
}

impl CastTable {
    /// Build the table for `descriptor`
    pub fn new(descriptor: &ShapeDescriptor) -> Self {
        let narrow = u32::try_from(descriptor.len()).is_ok();
        let extents = if narrow {
            descriptor.shape().iter().map(|&e| e as u32).collect()
        } else {
            AxisVec::new()
        };
        Self { extents, narrow }
    }

    /// Whether 32-bit decomposition can be used
    #[inline]
    pub fn is_narrow(&self) -> bool {
        self.narrow
    }
}

/// Per-call offset calculator for one descriptor
#[derive(Clone, Debug)]
pub struct ShapeIndexer<'a> {
    descriptor: &'a ShapeDescriptor,
    table: CastTable,
    // axes from fastest to slowest varying
    walk: AxisVec<usize>,
}

impl<'a> ShapeIndexer<'a> {
    /// Precompute the cast table and traversal order for `descriptor`
    pub fn new(descriptor: &'a ShapeDescriptor) -> Self {
        Self {
            descriptor,
            table: CastTable::new(descriptor),
            walk: axes_fastest_first(descriptor.rank(), descriptor.order()).collect(),
        }
    }

    /// Descriptor this indexer walks
    #[inline]
    pub fn descriptor(&self) -> &'a ShapeDescriptor {
        self.descriptor
    }

    /// Cast table in use
    #[inline]
    pub fn cast_table(&self) -> &CastTable {
        &self.table
    }

    /// Number of logical elements
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptor.len()
    }

    /// True when there is nothing to visit
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical offset of logical element `index`
    #[inline]
    pub fn offset_of(&self, index: usize) -> usize {
        debug_assert!(index < self.len().max(1));
        if let Some(ews) = self.descriptor.element_wise_stride() {
            return index * ews;
        }

        let strides = self.descriptor.strides();
        let mut offset = 0usize;
        if self.table.narrow {
            let mut rem = index as u32;
            for &axis in &self.walk {
                let extent = self.table.extents[axis];
                offset += (rem % extent) as usize * strides[axis];
                rem /= extent;
            }
        } else {
            let shape = self.descriptor.shape();
            let mut rem = index;
            for &axis in &self.walk {
                offset += (rem % shape[axis]) * strides[axis];
                rem /= shape[axis];
            }
        }
        offset
    }

    /// Per-axis coordinates of logical element `index`
    pub fn coords_of(&self, index: usize) -> AxisVec<usize> {
        let shape = self.descriptor.shape();
        let mut coords: AxisVec<usize> = std::iter::repeat(0).take(shape.len()).collect();
        let mut rem = index;
        for &axis in &self.walk {
            coords[axis] = rem % shape[axis];
            rem /= shape[axis];
        }
        coords
    }

    /// Iterate physical offsets for logical elements `start..start + len`
    ///
    /// Decomposes `start` once, then advances coordinates incrementally.
    pub fn cursor(&self, start: usize, len: usize) -> OffsetCursor<'_> {
        debug_assert!(start + len <= self.len());
        let (coords, offset) = if len == 0 {
            (AxisVec::new(), 0)
        } else {
            (self.coords_of(start), self.offset_of(start))
        };
        OffsetCursor {
            shape: self.descriptor.shape(),
            strides: self.descriptor.strides(),
            walk: &self.walk,
            coords,
            offset,
            remaining: len,
        }
    }
}

/// Iterator over physical offsets in logical order
#[derive(Clone, Debug)]
pub struct OffsetCursor<'a> {
    shape: &'a [usize],
    strides: &'a [usize],
    walk: &'a [usize],
    coords: AxisVec<usize>,
    offset: usize,
    remaining: usize,
}

impl Iterator for OffsetCursor<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;
        if self.remaining > 0 {
            for &axis in self.walk {
                self.coords[axis] += 1;
                self.offset += self.strides[axis];
                if self.coords[axis] < self.shape[axis] {
                    break;
                }
                self.offset -= self.strides[axis] * self.shape[axis];
                self.coords[axis] = 0;
            }
        }
        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OffsetCursor<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::tensor::Order;

    #[test]
    fn test_fast_path() {
        let d = ShapeDescriptor::contiguous(&[2, 3], DType::F32);
        assert_eq!(offset_of(&d, 0), 0);
        assert_eq!(offset_of(&d, 4), 4);
        assert!(is_contiguous(&d));
        assert_eq!(total_elements(&d), 6);
    }

    #[test]
    fn test_transposed_offsets() {
        // [[1,2,3],[4,5,6]] viewed as its transpose [[1,4],[2,5],[3,6]]
        let d = ShapeDescriptor::contiguous(&[2, 3], DType::F32)
            .transpose(0, 1)
            .unwrap();
        let offsets: Vec<usize> = (0..6).map(|i| offset_of(&d, i)).collect();
        assert_eq!(offsets, vec![0, 3, 1, 4, 2, 5]);

        let indexer = ShapeIndexer::new(&d);
        assert!(indexer.cast_table().is_narrow());
        let via_table: Vec<usize> = (0..6).map(|i| indexer.offset_of(i)).collect();
        assert_eq!(via_table, offsets);
        let via_cursor: Vec<usize> = indexer.cursor(0, 6).collect();
        assert_eq!(via_cursor, offsets);
    }

    #[test]
    fn test_column_major_order() {
        // Column-major traversal of row-major strides
        let d = ShapeDescriptor::new(&[2, 3], &[3, 1], Order::ColumnMajor, DType::F32).unwrap();
        assert_eq!(d.element_wise_stride(), None);
        let indexer = ShapeIndexer::new(&d);
        let offsets: Vec<usize> = indexer.cursor(0, 6).collect();
        assert_eq!(offsets, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_cursor_from_middle() {
        let d = ShapeDescriptor::new(&[3, 4], &[1, 3], Order::RowMajor, DType::F64).unwrap();
        let indexer = ShapeIndexer::new(&d);
        let all: Vec<usize> = indexer.cursor(0, 12).collect();
        let tail: Vec<usize> = indexer.cursor(5, 7).collect();
        assert_eq!(&all[5..], tail.as_slice());
        assert_eq!(indexer.cursor(5, 7).len(), 7);
    }

    #[test]
    fn test_broadcast_offsets_repeat() {
        let d = ShapeDescriptor::contiguous(&[3], DType::F32)
            .broadcast_to(&[2, 3])
            .unwrap();
        let indexer = ShapeIndexer::new(&d);
        let offsets: Vec<usize> = indexer.cursor(0, 6).collect();
        assert_eq!(offsets, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_coords() {
        let d = ShapeDescriptor::contiguous(&[2, 3, 4], DType::F32);
        let indexer = ShapeIndexer::new(&d);
        assert_eq!(indexer.coords_of(23).as_slice(), &[1, 2, 3]);
        assert_eq!(indexer.coords_of(5).as_slice(), &[0, 1, 1]);
    }

    #[test]
    fn test_empty_cursor() {
        let d = ShapeDescriptor::contiguous(&[0, 3], DType::F32);
        let indexer = ShapeIndexer::new(&d);
        assert!(indexer.is_empty());
        assert_eq!(indexer.cursor(0, 0).count(), 0);
    }
}
