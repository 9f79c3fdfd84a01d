//! Array layout and storage
//!
//! This module provides the [`ShapeDescriptor`] describing an array's layout,
//! the [`ShapeIndexer`] mapping logical indices to physical offsets, the
//! tensor-along-dimension decomposition used by reductions, and the owned
//! [`NdArray`] handle.

mod array;
mod descriptor;
mod dims;
mod index;
mod storage;
mod tad;

pub use array::NdArray;
pub(crate) use array::copy_logical;
pub use descriptor::{Order, ShapeDescriptor};
pub use dims::{MAX_RANK, Shape, Strides};
pub use index::{CastTable, OffsetCursor, ShapeIndexer, is_contiguous, offset_of, total_elements};
pub use storage::Storage;
pub use tad::{TadPack, TadSlice, decompose, validate_axes};
