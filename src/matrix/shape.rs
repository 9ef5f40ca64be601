//! Dimensions shared by every sparse format

/// Row count, column count and stored nonzero count of a sparse matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatrixShape {
    /// Number of rows in the matrix
    pub num_rows: usize,
    /// Number of columns in the matrix
    pub num_cols: usize,
    /// Number of stored entries
    pub num_nonzeros: usize,
}

impl MatrixShape {
    /// Creates a shape
    pub fn new(num_rows: usize, num_cols: usize, num_nonzeros: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            num_nonzeros,
        }
    }

    /// Whether `num_nonzeros` fits in a dense `num_rows × num_cols` matrix
    pub fn is_consistent(&self) -> bool {
        self.num_rows
            .checked_mul(self.num_cols)
            .map_or(true, |dense| self.num_nonzeros <= dense)
    }

    /// Average stored entries per row, 0 for a matrix without rows
    pub fn average_row_length(&self) -> f64 {
        if self.num_rows == 0 {
            0.0
        } else {
            self.num_nonzeros as f64 / self.num_rows as f64
        }
    }
}
