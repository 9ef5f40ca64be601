//! Conversions between our CSR matrices and `sprs`, plus Matrix Market input

use std::ops::Neg;
use std::path::Path;

use num_traits::Num;
use sprs::num_kinds::PrimitiveKind;
use sprs::num_matrixmarket::{MatrixMarketConjugate, MatrixMarketRead};
use sprs::CsMat;

use crate::error::{Error, Result};
use crate::matrix::CsrMatrix;

/// Converts our CSR matrix to a sprs CsMat in CSR storage
///
/// sprs requires sorted column indices within each row; matrices that
/// violate this are rejected with [`Error::InvalidMatrix`].
pub fn to_sprs_csr<T>(matrix: &CsrMatrix<T>) -> Result<CsMat<T>>
where
    T: Copy + Num,
{
    CsMat::try_new(
        (matrix.shape.num_rows, matrix.shape.num_cols),
        matrix.row_ptr.to_vec(),
        matrix.col_index.to_vec(),
        matrix.values.to_vec(),
    )
    .map_err(|(_, _, _, e)| Error::InvalidMatrix(e.to_string()))
}

/// Converts a sprs matrix in either storage order to a host CSR matrix
pub fn from_sprs_csr<T>(matrix: CsMat<T>) -> Result<CsrMatrix<T>>
where
    T: Copy + Num + Default,
{
    // Ensure matrix is in CSR format
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let (num_rows, num_cols) = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    CsrMatrix::new(num_rows, num_cols, indptr, indices, data)
}

/// Reads a Matrix Market coordinate file into a host CSR matrix
///
/// Duplicate entries are summed. Symmetric files are expanded to both
/// triangles by the reader.
pub fn read_matrix_market<T, P>(path: P) -> Result<CsrMatrix<T>>
where
    T: Copy + Num + Default + PrimitiveKind + MatrixMarketRead + MatrixMarketConjugate + Neg<Output = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let triplets = sprs::io::read_matrix_market::<T, usize, _>(path)?;
    let csr: CsMat<T> = triplets.to_csr();

    log::info!(
        "read {}: {} x {} with {} entries",
        path.display(),
        csr.rows(),
        csr.cols(),
        csr.nnz()
    );

    from_sprs_csr(csr)
}
