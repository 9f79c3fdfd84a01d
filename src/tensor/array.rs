//! Owned n-dimensional array: a shape descriptor paired with its storage

use super::descriptor::ShapeDescriptor;
use super::index::ShapeIndexer;
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// Dense n-dimensional array on the host
///
/// `NdArray` consists of:
/// - **Descriptor**: extents, strides, order and dtype
/// - **Storage**: a buffer at least as long as the descriptor's addressed span
///
/// Strided layouts over a copied buffer (a transpose, a broadcast) are built
/// with [`with_descriptor`](Self::with_descriptor); the element at logical
/// index `i` is always `storage[offset_of(i)]`.
///
/// # Example
///
/// ```
/// use ndexec::tensor::NdArray;
///
/// let a = NdArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
/// let t = a.transposed(0, 1)?;
/// assert_eq!(t.to_vec::<f32>()?, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// # Ok::<(), ndexec::error::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NdArray {
    descriptor: ShapeDescriptor,
    storage: Storage,
}

impl NdArray {
    /// Allocate a zero-filled array for `descriptor`
    pub fn zeros(descriptor: ShapeDescriptor) -> Result<Self> {
        let storage = Storage::zeroed(descriptor.required_len(), descriptor.dtype())?;
        Ok(Self {
            descriptor,
            storage,
        })
    }

    /// Copy row-major `data` into a new contiguous array of shape `extents`
    ///
    /// Returns an error if `data.len()` does not equal the product of `extents`.
    pub fn from_slice<T: Element>(data: &[T], extents: &[usize]) -> Result<Self> {
        let expected: usize = extents.iter().product();
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: extents.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            descriptor: ShapeDescriptor::contiguous(extents, T::DTYPE),
            storage: Storage::from_slice(data)?,
        })
    }

    /// Take ownership of row-major `data`
    pub fn from_vec<T: Element>(data: Vec<T>, extents: &[usize]) -> Result<Self> {
        Self::from_slice(&data, extents)
    }

    /// Rank-0 array holding `value`
    pub fn scalar<T: Element>(value: T) -> Result<Self> {
        Self::from_slice(&[value], &[])
    }

    /// Copy of this array whose buffer is read through another descriptor
    ///
    /// The buffer is copied as is, so the result is independent of `self`:
    /// writes to one are not seen by the other. The new descriptor must keep
    /// the dtype and must not address past the end of the buffer.
    pub fn with_descriptor(&self, descriptor: ShapeDescriptor) -> Result<Self> {
        if descriptor.dtype() != self.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: descriptor.dtype(),
                rhs: self.dtype(),
            });
        }
        if descriptor.required_len() > self.storage.len() {
            return Err(Error::invalid_shape(format!(
                "layout {:?} addresses {} elements but the buffer holds {}",
                descriptor,
                descriptor.required_len(),
                self.storage.len()
            )));
        }
        Ok(Self {
            descriptor,
            storage: self.storage.clone(),
        })
    }

    /// Copy with two axes swapped in the descriptor (the buffer is unchanged)
    pub fn transposed(&self, axis0: usize, axis1: usize) -> Result<Self> {
        self.with_descriptor(self.descriptor.transpose(axis0, axis1)?)
    }

    /// Layout descriptor
    #[inline]
    pub fn descriptor(&self) -> &ShapeDescriptor {
        &self.descriptor
    }

    /// Underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.descriptor.dtype()
    }

    /// Per-axis extents
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.descriptor.shape()
    }

    /// Number of axes
    #[inline]
    pub fn ndim(&self) -> usize {
        self.descriptor.rank()
    }

    /// Number of logical elements
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptor.len()
    }

    /// True when the array holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptor.is_empty()
    }

    /// Physical buffer typed as `T`
    ///
    /// Element `i` of the array lives at `as_slice()[offset_of(i)]`, which
    /// only equals `i` for contiguous layouts.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        self.storage.typed()
    }

    /// Mutable physical buffer typed as `T`
    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        self.storage.typed_mut()
    }

    /// Copy the elements out in logical order
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let data = self.as_slice::<T>()?;
        if self.descriptor.is_contiguous() {
            return Ok(data[..self.len()].to_vec());
        }
        let indexer = ShapeIndexer::new(&self.descriptor);
        Ok(indexer
            .cursor(0, indexer.len())
            .map(|offset| data[offset])
            .collect())
    }

    /// Overwrite the elements in logical order from `values`
    pub fn write_logical<T: Element>(&mut self, values: &[T]) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::shape_mismatch(self.shape(), &[values.len()]));
        }
        let descriptor = self.descriptor.clone();
        let data = self.storage.typed_mut::<T>()?;
        let indexer = ShapeIndexer::new(&descriptor);
        for (offset, &value) in indexer.cursor(0, indexer.len()).zip(values) {
            data[offset] = value;
        }
        Ok(())
    }

    /// Contiguous copy with the same extents and order
    pub fn to_contiguous(&self) -> Result<Self> {
        let descriptor = ShapeDescriptor::contiguous_with_order(
            self.shape(),
            self.descriptor.order(),
            self.dtype(),
        );
        if self.descriptor == descriptor {
            return Ok(self.clone());
        }
        let mut out = Self::zeros(descriptor)?;
        copy_logical(self, &mut out)?;
        Ok(out)
    }
}

/// Copy `src` into `dst` element by element in logical order
///
/// Both arrays must have the same dtype and element count.
pub(crate) fn copy_logical(src: &NdArray, dst: &mut NdArray) -> Result<()> {
    crate::dispatch_dtype!(src.dtype(), T => {
        let values = src.to_vec::<T>()?;
        dst.write_logical::<T>(&values)
    }, "copy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_checks_len() {
        let err = NdArray::from_slice(&[1.0f32, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_scalar() {
        let s = NdArray::scalar(7i64).unwrap();
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.len(), 1);
        assert_eq!(s.to_vec::<i64>().unwrap(), vec![7]);
    }

    #[test]
    fn test_typed_access_checks_dtype() {
        let a = NdArray::from_slice(&[1i32, 2], &[2]).unwrap();
        assert!(a.as_slice::<f32>().is_err());
        assert_eq!(a.as_slice::<i32>().unwrap(), &[1, 2]);
    }

    #[test]
    fn test_broadcast_view_to_vec() {
        let a = NdArray::from_slice(&[1u8, 2, 3], &[3]).unwrap();
        let view = a
            .with_descriptor(a.descriptor().broadcast_to(&[2, 3]).unwrap())
            .unwrap();
        assert_eq!(view.to_vec::<u8>().unwrap(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_view_must_fit_buffer() {
        let a = NdArray::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        let too_big = ShapeDescriptor::contiguous(&[3], DType::F64);
        assert!(a.with_descriptor(too_big).is_err());
        let wrong_type = ShapeDescriptor::contiguous(&[2], DType::F32);
        assert!(matches!(
            a.with_descriptor(wrong_type),
            Err(Error::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_write_logical_on_transposed() {
        let a = NdArray::zeros(ShapeDescriptor::contiguous(&[2, 3], DType::F32)).unwrap();
        let mut t = a.transposed(0, 1).unwrap();
        t.write_logical(&[1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        assert_eq!(
            t.as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_relaid_copy_is_independent() {
        let a = NdArray::from_slice(&[1i64, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        let mut t = a.transposed(0, 1).unwrap();
        t.write_logical(&[0i64; 6]).unwrap();
        assert_eq!(t.to_vec::<i64>().unwrap(), vec![0; 6]);
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_to_contiguous() {
        let a = NdArray::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        let c = a.transposed(0, 1).unwrap().to_contiguous().unwrap();
        assert!(c.descriptor().is_contiguous());
        assert_eq!(c.shape(), &[3, 2]);
        assert_eq!(c.as_slice::<i32>().unwrap(), &[1, 4, 2, 5, 3, 6]);
    }
}
