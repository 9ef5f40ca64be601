//! Compressed Sparse Row (CSR) matrix format implementation

use std::fmt;

use num_traits::Num;

use crate::error::{Error, Result};
use crate::matrix::MatrixShape;
use crate::memory::{LocatedArray, MemoryLocation};

/// A sparse matrix in Compressed Sparse Row (CSR) format
///
/// The CSR format stores a sparse matrix using three arrays:
/// - row_ptr: Array of size num_rows + 1 containing indices into col_index and values arrays
/// - col_index: Array of size nnz containing column indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// All three arrays live in the same [`MemoryLocation`].
#[derive(Clone)]
pub struct CsrMatrix<T> {
    /// Dimensions and nonzero count
    pub shape: MatrixShape,

    /// Row pointers (size: num_rows + 1)
    /// row_ptr[i] is the index in col_index and values where row i starts
    /// row_ptr[num_rows] is equal to nnz
    pub row_ptr: LocatedArray<usize>,

    /// Column indices (size: nnz)
    pub col_index: LocatedArray<usize>,

    /// Non-zero values (size: nnz)
    pub values: LocatedArray<T>,
}

impl<T> CsrMatrix<T>
where
    T: Copy + Num,
{
    /// Creates a new host-resident CSR matrix with the given dimensions and data
    ///
    /// # Arguments
    ///
    /// * `num_rows` - Number of rows
    /// * `num_cols` - Number of columns
    /// * `row_ptr` - Row pointers
    /// * `col_index` - Column indices
    /// * `values` - Non-zero values
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] if the input arrays are inconsistent:
    /// - row_ptr.len() must be num_rows + 1
    /// - col_index.len() must equal values.len()
    /// - row_ptr must start at 0, never decrease and end at col_index.len()
    /// - every column index must be below num_cols
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        row_ptr: Vec<usize>,
        col_index: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        if row_ptr.len() != num_rows + 1 {
            return Err(Error::InvalidMatrix(format!(
                "row_ptr has {} entries, expected num_rows + 1 = {}",
                row_ptr.len(),
                num_rows + 1
            )));
        }
        if col_index.len() != values.len() {
            return Err(Error::InvalidMatrix(format!(
                "col_index has {} entries but values has {}",
                col_index.len(),
                values.len()
            )));
        }
        if row_ptr[0] != 0 || row_ptr[num_rows] != col_index.len() {
            return Err(Error::InvalidMatrix(format!(
                "row_ptr must span 0..{}, got {}..{}",
                col_index.len(),
                row_ptr[0],
                row_ptr[num_rows]
            )));
        }
        if let Some(i) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::InvalidMatrix(format!(
                "row_ptr decreases at row {}",
                i
            )));
        }
        if let Some(&col) = col_index.iter().find(|&&col| col >= num_cols) {
            return Err(Error::InvalidMatrix(format!(
                "column index {} out of bounds (num_cols = {})",
                col, num_cols
            )));
        }

        let shape = MatrixShape::new(num_rows, num_cols, col_index.len());
        if !shape.is_consistent() {
            return Err(Error::InvalidMatrix(format!(
                "{} nonzeros do not fit in a {} x {} matrix",
                shape.num_nonzeros, num_rows, num_cols
            )));
        }

        Ok(Self {
            shape,
            row_ptr: LocatedArray::from_vec(row_ptr),
            col_index: LocatedArray::from_vec(col_index),
            values: LocatedArray::from_vec(values),
        })
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.shape.num_nonzeros
    }

    /// Location of the matrix arrays
    pub fn location(&self) -> MemoryLocation {
        self.values.location()
    }

    /// Number of stored entries in row i
    pub fn row_len(&self, i: usize) -> usize {
        let row_ptr = self.row_ptr.as_slice();
        row_ptr[i + 1] - row_ptr[i]
    }

    /// Length of the longest row
    pub fn max_row_len(&self) -> usize {
        (0..self.shape.num_rows)
            .map(|i| self.row_len(i))
            .max()
            .unwrap_or(0)
    }

    /// Returns an iterator over the non-zero elements in row i
    ///
    /// Each item is a tuple (col_index, value) representing a non-zero element
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        assert!(i < self.shape.num_rows, "Row index out of bounds");

        let row_ptr = self.row_ptr.as_slice();
        let start = row_ptr[i];
        let end = row_ptr[i + 1];

        self.col_index.as_slice()[start..end]
            .iter()
            .zip(&self.values.as_slice()[start..end])
            .map(|(&col, val)| (col, val))
    }

    /// Copies the three arrays to `location`; the shape is carried over unchanged
    pub fn to_location(&self, location: MemoryLocation) -> Result<Self> {
        Ok(Self {
            shape: self.shape,
            row_ptr: self.row_ptr.to_location(location)?,
            col_index: self.col_index.to_location(location)?,
            values: self.values.to_location(location)?,
        })
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            shape: MatrixShape::new(num_rows, num_cols, 0),
            row_ptr: LocatedArray::from_vec(vec![0; num_rows + 1]),
            col_index: LocatedArray::from_vec(Vec::new()),
            values: LocatedArray::from_vec(Vec::new()),
        }
    }

    /// Creates an identity matrix of the given size
    pub fn identity(n: usize) -> Self {
        Self {
            shape: MatrixShape::new(n, n, n),
            row_ptr: LocatedArray::from_vec((0..=n).collect()),
            col_index: LocatedArray::from_vec((0..n).collect()),
            values: LocatedArray::from_vec(vec![T::one(); n]),
        }
    }
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for CsrMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CsrMatrix {{")?;
        writeln!(
            f,
            "  dimensions: {} × {} [{}]",
            self.shape.num_rows,
            self.shape.num_cols,
            self.location()
        )?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        // Print a sample of the matrix content
        let max_rows_to_print = 5.min(self.shape.num_rows);

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let len = self.row_len(i);

                if len == 0 {
                    writeln!(f, "(empty)")?;
                } else {
                    for (col, val) in self.row_iter(i).take(5) {
                        write!(f, "({}, {:?}) ", col, val)?;
                    }

                    if len > 5 {
                        write!(f, "... ({} more)", len - 5)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.shape.num_rows > max_rows_to_print {
                writeln!(
                    f,
                    "    ... ({} more rows)",
                    self.shape.num_rows - max_rows_to_print
                )?;
            }
        }

        write!(f, "}}")
    }
}
