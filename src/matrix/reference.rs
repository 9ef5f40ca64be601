//! Serial CSR multiply used as the correctness reference
//!
//! One row at a time and one vector at a time, accumulating in CSR order.

use num_traits::Num;

use crate::error::{Error, Result};
use crate::matrix::CsrMatrix;

/// Computes y += A*x for a single vector
///
/// `x` must hold at least `num_cols` entries and `y` at least `num_rows`.
pub fn spmv_csr_serial<T>(csr: &CsrMatrix<T>, x: &[T], y: &mut [T]) -> Result<()>
where
    T: Copy + Num,
{
    let num_rows = csr.shape.num_rows;
    check_len("x", x.len(), csr.shape.num_cols)?;
    check_len("y", y.len(), num_rows)?;

    let row_ptr = csr.row_ptr.as_slice();
    let col_index = csr.col_index.as_slice();
    let values = csr.values.as_slice();

    for i in 0..num_rows {
        let mut sum = y[i];
        for jj in row_ptr[i]..row_ptr[i + 1] {
            sum = sum + x[col_index[jj]] * values[jj];
        }
        y[i] = sum;
    }

    Ok(())
}

/// Computes Y += A*X for `num_vectors` column-major vectors, one column at a time
pub fn spmm_csr_serial<T>(csr: &CsrMatrix<T>, x: &[T], y: &mut [T], num_vectors: usize) -> Result<()>
where
    T: Copy + Num,
{
    let num_rows = csr.shape.num_rows;
    let num_cols = csr.shape.num_cols;
    check_len("X block", x.len(), num_cols * num_vectors)?;
    check_len("Y block", y.len(), num_rows * num_vectors)?;

    for j in 0..num_vectors {
        spmv_csr_serial(
            csr,
            &x[j * num_cols..(j + 1) * num_cols],
            &mut y[j * num_rows..(j + 1) * num_rows],
        )?;
    }

    Ok(())
}

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got < expected {
        return Err(Error::DimensionMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}
