//! Storage: host memory for array elements
//!
//! Elements live in a `u64` word buffer so every supported element type
//! (at most 8 bytes wide) can be viewed in place through bytemuck without
//! alignment violations.

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

const WORD: usize = std::mem::size_of::<u64>();

/// Owned, zero-initialised element buffer tagged with its dtype
#[derive(Clone, PartialEq)]
pub struct Storage {
    words: Vec<u64>,
    len: usize,
    dtype: DType,
}

impl Storage {
    /// Allocate `len` zeroed elements of `dtype`
    ///
    /// Fails with [`Error::OutOfMemory`] instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn zeroed(len: usize, dtype: DType) -> Result<Self> {
        let size = len
            .checked_mul(dtype.size_in_bytes())
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let n_words = size.div_ceil(WORD);

        let mut words: Vec<u64> = Vec::new();
        words
            .try_reserve_exact(n_words)
            .map_err(|_| Error::OutOfMemory { size })?;
        words.resize(n_words, 0);

        Ok(Self { words, len, dtype })
    }

    /// Copy `data` into new storage with dtype inferred from `T`
    pub fn from_slice<T: Element>(data: &[T]) -> Result<Self> {
        let mut storage = Self::zeroed(data.len(), T::DTYPE)?;
        storage.typed_mut::<T>()?.copy_from_slice(data);
        Ok(storage)
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len * self.dtype.size_in_bytes()
    }

    /// Raw bytes of the element buffer
    pub fn as_bytes(&self) -> &[u8] {
        let bytes: &[u8] = bytemuck::cast_slice(&self.words);
        &bytes[..self.size_in_bytes()]
    }

    /// View the buffer as `T`, checking the dtype tag
    pub fn typed<T: Element>(&self) -> Result<&[T]> {
        self.check::<T>()?;
        let all: &[T] = bytemuck::cast_slice(&self.words);
        Ok(&all[..self.len])
    }

    /// Mutable view of the buffer as `T`, checking the dtype tag
    pub fn typed_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        self.check::<T>()?;
        let len = self.len;
        let all: &mut [T] = bytemuck::cast_slice_mut(&mut self.words);
        Ok(&mut all[..len])
    }

    fn check<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                lhs: T::DTYPE,
                rhs: self.dtype,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len)
            .field("dtype", &self.dtype)
            .finish()
    }
}
