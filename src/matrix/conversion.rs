//! Conversion functions between matrix formats

use num_traits::Num;

use crate::constants::{ELL_CAPACITY_FACTOR, ELL_PADDING, ELL_STRIDE_ALIGNMENT};
use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, EllMatrix, MatrixShape};
use crate::memory::{LocatedArray, MemoryLocation};

/// Per-row ELL capacity derived from the average row length
///
/// Returns `⌊3·nnz / num_rows⌋ + 1`, or 1 for a matrix without rows. Rows
/// longer than this bound make the matrix a poor fit for ELL.
pub fn ell_capacity_heuristic<T: Copy + Num>(csr: &CsrMatrix<T>) -> usize {
    let shape = csr.shape;
    if shape.num_rows == 0 {
        return 1;
    }
    (ELL_CAPACITY_FACTOR * shape.num_nonzeros) / shape.num_rows + 1
}

/// ELL row pitch for a matrix with `num_rows` rows
pub fn ell_stride(num_rows: usize) -> usize {
    num_rows.div_ceil(ELL_STRIDE_ALIGNMENT) * ELL_STRIDE_ALIGNMENT
}

/// Converts a host-resident CSR matrix to ELL format
///
/// Each row's entries are copied in CSR order into its first slots; the
/// remaining slots are padding. `num_cols_per_row` of the result is the
/// length of the longest row.
///
/// # Errors
///
/// Returns [`Error::CapacityExceeded`] naming the first row whose length is
/// greater than `max_cols_per_row`, and [`Error::LocationMismatch`] if the
/// CSR arrays are not in host memory.
pub fn csr_to_ell<T>(csr: &CsrMatrix<T>, max_cols_per_row: usize) -> Result<EllMatrix<T>>
where
    T: Copy + Num,
{
    csr.values.expect_location("CSR matrix", MemoryLocation::Host)?;

    let MatrixShape {
        num_rows,
        num_cols,
        num_nonzeros,
    } = csr.shape;

    let mut num_cols_per_row = 0;
    for row in 0..num_rows {
        let len = csr.row_len(row);
        if len > max_cols_per_row {
            return Err(Error::CapacityExceeded {
                row,
                row_nonzeros: len,
                max_cols_per_row,
            });
        }
        num_cols_per_row = num_cols_per_row.max(len);
    }

    let stride = ell_stride(num_rows);
    let slots = stride * num_cols_per_row;
    let mut col_index = vec![ELL_PADDING; slots];
    let mut values = vec![T::zero(); slots];

    for row in 0..num_rows {
        for (n, (col, &val)) in csr.row_iter(row).enumerate() {
            let slot = row + n * stride;
            col_index[slot] = col;
            values[slot] = val;
        }
    }

    log::debug!(
        "converted {}x{} CSR ({} nnz) to ELL: {} cols per row, stride {}",
        num_rows,
        num_cols,
        num_nonzeros,
        num_cols_per_row,
        stride
    );

    Ok(EllMatrix {
        shape: csr.shape,
        stride,
        num_cols_per_row,
        col_index: LocatedArray::from_vec(col_index),
        values: LocatedArray::from_vec(values),
    })
}

impl<T: Copy + Num> CsrMatrix<T> {
    /// Converts this CSR matrix to ELL format with the given per-row capacity
    pub fn to_ell(&self, max_cols_per_row: usize) -> Result<EllMatrix<T>> {
        csr_to_ell(self, max_cols_per_row)
    }
}

impl<T: Copy + Num> EllMatrix<T> {
    /// Reads this ELL matrix back into CSR format, row by row in slot order
    pub fn to_csr(&self) -> Result<CsrMatrix<T>> {
        let num_rows = self.shape.num_rows;
        let mut row_ptr = Vec::with_capacity(num_rows + 1);
        let mut col_index = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());

        row_ptr.push(0);
        for row in 0..num_rows {
            for (col, &val) in self.row_iter(row) {
                col_index.push(col);
                values.push(val);
            }
            row_ptr.push(col_index.len());
        }

        CsrMatrix::new(num_rows, self.shape.num_cols, row_ptr, col_index, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //    [1 2 0]
    //    [0 3 0]
    //    [4 0 5]
    fn sample() -> CsrMatrix<f64> {
        CsrMatrix::new(
            3,
            3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap()
    }

    #[test]
    fn test_csr_to_ell_layout() {
        let ell = csr_to_ell(&sample(), 4).unwrap();

        assert_eq!(ell.shape, MatrixShape::new(3, 3, 5));
        assert_eq!(ell.num_cols_per_row, 2);
        assert_eq!(ell.stride, 32);

        // Slot k of row i lives at i + k * stride
        let cols = ell.col_index.as_slice();
        let vals = ell.values.as_slice();
        assert_eq!((cols[0], vals[0]), (0, 1.0));
        assert_eq!((cols[32], vals[32]), (1, 2.0));
        assert_eq!((cols[1], vals[1]), (1, 3.0));
        assert_eq!((cols[33], vals[33]), (ELL_PADDING, 0.0));
        assert_eq!((cols[2], vals[2]), (0, 4.0));
        assert_eq!((cols[34], vals[34]), (2, 5.0));
        assert_eq!(cols[3], ELL_PADDING);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let original = sample();
        let roundtrip = csr_to_ell(&original, 2).unwrap().to_csr().unwrap();

        assert_eq!(roundtrip.row_ptr.as_slice(), original.row_ptr.as_slice());
        assert_eq!(roundtrip.col_index.as_slice(), original.col_index.as_slice());
        assert_eq!(roundtrip.values.as_slice(), original.values.as_slice());
    }

    #[test]
    fn test_explicit_zero_is_kept() {
        let csr = CsrMatrix::new(2, 2, vec![0, 2, 2], vec![0, 1], vec![0.0, 7.0]).unwrap();
        let ell = csr_to_ell(&csr, 2).unwrap();

        assert_eq!(ell.nnz(), 2);
        let row0: Vec<_> = ell.row_iter(0).collect();
        assert_eq!(row0, vec![(0, &0.0), (1, &7.0)]);
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = csr_to_ell(&sample(), 1).unwrap_err();
        match err {
            Error::CapacityExceeded {
                row,
                row_nonzeros,
                max_cols_per_row,
            } => {
                assert_eq!(row, 0);
                assert_eq!(row_nonzeros, 2);
                assert_eq!(max_cols_per_row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_matrix_converts() {
        let csr = CsrMatrix::<f64>::zeros(4, 4);
        let ell = csr_to_ell(&csr, ell_capacity_heuristic(&csr)).unwrap();
        assert_eq!(ell.nnz(), 0);
        assert_eq!(ell.num_cols_per_row, 0);
        assert_eq!(ell.shape.num_rows, 4);
    }

    #[test]
    fn test_capacity_heuristic() {
        assert_eq!(ell_capacity_heuristic(&sample()), 6);
        assert_eq!(ell_capacity_heuristic(&CsrMatrix::<f64>::zeros(0, 3)), 1);
        assert_eq!(ell_capacity_heuristic(&CsrMatrix::<f64>::identity(4)), 4);
    }

    #[test]
    fn test_device_csr_rejected() {
        let device = sample().to_location(MemoryLocation::Device).unwrap();
        assert!(matches!(
            csr_to_ell(&device, 4),
            Err(Error::LocationMismatch { .. })
        ));
    }

    #[test]
    fn test_stride_alignment() {
        assert_eq!(ell_stride(0), 0);
        assert_eq!(ell_stride(1), 32);
        assert_eq!(ell_stride(32), 32);
        assert_eq!(ell_stride(33), 64);
    }
}
