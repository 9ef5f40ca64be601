//! ELLPACK (ELL) matrix format
//!
//! ELL stores a fixed number of slots per row. Slot `k` of row `i` lives at
//! `i + k * stride`, so for a fixed `k` consecutive rows are adjacent in
//! memory and a row-parallel kernel reads each slot column contiguously.
//! Rows shorter than `num_cols_per_row` are filled with padding slots whose
//! column index is [`ELL_PADDING`] and whose value is zero.

use std::fmt;

use num_traits::Num;

use crate::constants::ELL_PADDING;
use crate::error::{Error, Result};
use crate::matrix::MatrixShape;
use crate::memory::{LocatedArray, MemoryLocation};

/// A sparse matrix in ELLPACK format with column-major slot storage
#[derive(Clone)]
pub struct EllMatrix<T> {
    /// Dimensions and count of non-padding slots
    pub shape: MatrixShape,

    /// Row pitch of the slot arrays (at least num_rows)
    pub stride: usize,

    /// Slots available to every row
    pub num_cols_per_row: usize,

    /// Column indices, `stride * num_cols_per_row` entries
    pub col_index: LocatedArray<usize>,

    /// Values, same layout as `col_index`
    pub values: LocatedArray<T>,
}

impl<T> EllMatrix<T>
where
    T: Copy + Num,
{
    /// Creates a host-resident ELL matrix from raw slot arrays
    ///
    /// `num_nonzeros` is derived from the number of non-padding slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] if `stride < num_rows`, if either array
    /// does not hold `stride * num_cols_per_row` entries, or if a non-padding
    /// column index is out of bounds.
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        stride: usize,
        num_cols_per_row: usize,
        col_index: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        if stride < num_rows {
            return Err(Error::InvalidMatrix(format!(
                "stride {} is smaller than num_rows {}",
                stride, num_rows
            )));
        }
        let slots = stride * num_cols_per_row;
        if col_index.len() != slots || values.len() != slots {
            return Err(Error::InvalidMatrix(format!(
                "ELL arrays must hold {} slots, got {} indices and {} values",
                slots,
                col_index.len(),
                values.len()
            )));
        }

        let mut num_nonzeros = 0;
        for k in 0..num_cols_per_row {
            for row in 0..num_rows {
                let col = col_index[row + k * stride];
                if col == ELL_PADDING {
                    continue;
                }
                if col >= num_cols {
                    return Err(Error::InvalidMatrix(format!(
                        "column index {} out of bounds (num_cols = {})",
                        col, num_cols
                    )));
                }
                num_nonzeros += 1;
            }
        }

        Ok(Self {
            shape: MatrixShape::new(num_rows, num_cols, num_nonzeros),
            stride,
            num_cols_per_row,
            col_index: LocatedArray::from_vec(col_index),
            values: LocatedArray::from_vec(values),
        })
    }

    /// Returns the number of non-padding slots
    pub fn nnz(&self) -> usize {
        self.shape.num_nonzeros
    }

    /// Total slots including padding
    pub fn num_slots(&self) -> usize {
        self.stride * self.num_cols_per_row
    }

    /// Location of the matrix arrays
    pub fn location(&self) -> MemoryLocation {
        self.values.location()
    }

    /// Returns an iterator over the stored entries of row i in slot order
    ///
    /// Padding slots are skipped. Each item is a tuple (col_index, value).
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        assert!(i < self.shape.num_rows, "Row index out of bounds");

        let cols = self.col_index.as_slice();
        let vals = self.values.as_slice();

        (0..self.num_cols_per_row)
            .map(move |k| i + k * self.stride)
            .filter(move |&slot| cols[slot] != ELL_PADDING)
            .map(move |slot| (cols[slot], &vals[slot]))
    }

    /// Copies both slot arrays to `location`; shape and layout are carried over
    pub fn to_location(&self, location: MemoryLocation) -> Result<Self> {
        Ok(Self {
            shape: self.shape,
            stride: self.stride,
            num_cols_per_row: self.num_cols_per_row,
            col_index: self.col_index.to_location(location)?,
            values: self.values.to_location(location)?,
        })
    }

    /// Returns a copy with `extra` padding slots appended to every row
    pub fn with_extra_padding(&self, extra: usize) -> Self {
        let width = self.num_cols_per_row + extra;
        let slots = self.stride * width;
        let mut col_index = self.col_index.to_vec();
        let mut values = self.values.to_vec();
        col_index.resize(slots, ELL_PADDING);
        values.resize(slots, T::zero());

        Self {
            shape: self.shape,
            stride: self.stride,
            num_cols_per_row: width,
            col_index: LocatedArray::from_vec(col_index),
            values: LocatedArray::from_vec(values),
        }
    }
}

impl<T> fmt::Debug for EllMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EllMatrix")
            .field("shape", &self.shape)
            .field("stride", &self.stride)
            .field("num_cols_per_row", &self.num_cols_per_row)
            .field("location", &self.values.location())
            .finish()
    }
}
