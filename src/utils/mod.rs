//! Utility functions and helpers

pub mod formats;
pub mod prefetch;

pub use formats::{from_sprs_csr, read_matrix_market, to_sprs_csr};
