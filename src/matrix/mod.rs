// Matrix data structures and operations

pub mod conversion;
pub mod coo;
pub mod csr;
pub mod ell;
pub mod reference;
pub mod shape;

pub use conversion::{csr_to_ell, ell_capacity_heuristic, ell_stride};
pub use coo::{CooMatrix, HybMatrix};
pub use csr::CsrMatrix;
pub use ell::EllMatrix;
pub use reference::{spmm_csr_serial, spmv_csr_serial};
pub use shape::MatrixShape;
