//! Coordinate (COO) and hybrid ELL/COO containers
//!
//! These formats are declared so that matrices can be staged between
//! locations alongside ELL and CSR; the SpMM kernels do not consume them.

use num_traits::Num;

use crate::error::{Error, Result};
use crate::matrix::{EllMatrix, MatrixShape};
use crate::memory::{LocatedArray, MemoryLocation};

/// A sparse matrix stored as (row, column, value) triplets
#[derive(Clone, Debug)]
pub struct CooMatrix<T> {
    /// Dimensions and nonzero count
    pub shape: MatrixShape,
    /// Row indices (size: nnz)
    pub row_index: LocatedArray<usize>,
    /// Column indices (size: nnz)
    pub col_index: LocatedArray<usize>,
    /// Values (size: nnz)
    pub values: LocatedArray<T>,
}

impl<T> CooMatrix<T>
where
    T: Copy + Num,
{
    /// Creates a host-resident COO matrix from triplet arrays
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        row_index: Vec<usize>,
        col_index: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        if row_index.len() != values.len() || col_index.len() != values.len() {
            return Err(Error::InvalidMatrix(format!(
                "COO arrays differ in length: {} rows, {} cols, {} values",
                row_index.len(),
                col_index.len(),
                values.len()
            )));
        }
        if row_index.iter().any(|&r| r >= num_rows) || col_index.iter().any(|&c| c >= num_cols) {
            return Err(Error::InvalidMatrix(format!(
                "COO index out of bounds for a {} x {} matrix",
                num_rows, num_cols
            )));
        }

        Ok(Self {
            shape: MatrixShape::new(num_rows, num_cols, values.len()),
            row_index: LocatedArray::from_vec(row_index),
            col_index: LocatedArray::from_vec(col_index),
            values: LocatedArray::from_vec(values),
        })
    }

    /// Returns the number of stored triplets
    pub fn nnz(&self) -> usize {
        self.shape.num_nonzeros
    }

    /// Location of the matrix arrays
    pub fn location(&self) -> MemoryLocation {
        self.values.location()
    }

    /// Copies the three arrays to `location`
    pub fn to_location(&self, location: MemoryLocation) -> Result<Self> {
        Ok(Self {
            shape: self.shape,
            row_index: self.row_index.to_location(location)?,
            col_index: self.col_index.to_location(location)?,
            values: self.values.to_location(location)?,
        })
    }
}

/// Hybrid matrix: a regular ELL part plus a COO part for overflow entries
#[derive(Clone, Debug)]
pub struct HybMatrix<T> {
    /// Dimensions and total nonzero count
    pub shape: MatrixShape,
    /// Entries that fit the per-row capacity
    pub ell: EllMatrix<T>,
    /// Remaining entries
    pub coo: CooMatrix<T>,
}

impl<T> HybMatrix<T>
where
    T: Copy + Num,
{
    /// Combines an ELL and a COO part of the same dimensions
    pub fn new(ell: EllMatrix<T>, coo: CooMatrix<T>) -> Result<Self> {
        if ell.shape.num_rows != coo.shape.num_rows || ell.shape.num_cols != coo.shape.num_cols {
            return Err(Error::InvalidMatrix(format!(
                "HYB parts disagree: ELL is {} x {}, COO is {} x {}",
                ell.shape.num_rows, ell.shape.num_cols, coo.shape.num_rows, coo.shape.num_cols
            )));
        }
        let shape = MatrixShape::new(
            ell.shape.num_rows,
            ell.shape.num_cols,
            ell.nnz() + coo.nnz(),
        );
        Ok(Self { shape, ell, coo })
    }

    /// Copies both parts to `location`
    pub fn to_location(&self, location: MemoryLocation) -> Result<Self> {
        Ok(Self {
            shape: self.shape,
            ell: self.ell.to_location(location)?,
            coo: self.coo.to_location(location)?,
        })
    }
}
