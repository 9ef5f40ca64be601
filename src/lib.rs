//! # ellspmm: ELLPACK sparse matrix times multiple vectors
//!
//! Computes `Y += A * X` where `A` is a sparse matrix in ELLPACK (ELL)
//! layout and `X`, `Y` are dense blocks of right-hand-side vectors. Kernels
//! are specialized per vector block width so each row keeps one accumulator
//! per vector in registers.
//!
//! ## Overview
//!
//! - **Memory locations**: arrays are tagged as host or device memory and
//!   only move between the two through explicit copies ([`memory`]).
//! - **Sparse formats**: CSR input, ELL compute format and the CSR to ELL
//!   conversion ([`matrix`]).
//! - **Kernels**: one const-generic kernel instantiated for every supported
//!   width, and a dispatcher that covers many vectors in fixed-width launches
//!   ([`kernel`]).
//! - **Harnesses**: a throughput benchmark ([`bench`]) and a correctness
//!   check against a serial CSR reference ([`verify`]).
//!
//! The device is a dedicated Rayon pool; a launch spreads blocks of rows over
//! its workers.
//!
//! ## Usage
//!
//! ```
//! use ellspmm::{csr_to_ell, spmm_ell, CsrMatrix, Device, FetchMode, LocatedArray, MemoryLocation};
//!
//! # fn main() -> ellspmm::Result<()> {
//! let device = Device::with_threads(2)?;
//! let csr = CsrMatrix::<f64>::identity(4);
//! let ell = csr_to_ell(&csr, 1)?.to_location(MemoryLocation::Device)?;
//!
//! // Two vectors, column-major
//! let x = LocatedArray::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], MemoryLocation::Device)?;
//! let mut y = LocatedArray::from_slice(&[0.0; 8], MemoryLocation::Device)?;
//!
//! spmm_ell(&device, &ell, &x, &mut y, 2, 2, FetchMode::Direct)?;
//! assert_eq!(y.to_vec(), x.to_vec());
//! # Ok(())
//! # }
//! ```

pub mod bench;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod generate;
pub mod kernel;
pub mod matrix;
pub mod memory;
pub mod utils;
pub mod verify;

// Re-export primary components
pub use bench::{benchmark_ell, benchmark_ell_on_device, bytes_per_spmm, BenchmarkReport};
pub use config::{BenchmarkConfig, SpmmConfig, SystemParameters};
pub use device::Device;
pub use error::{Error, Result};
pub use kernel::{spmm_ell, EllSpmm, FetchMode, SpmmKernel};
pub use matrix::{csr_to_ell, ell_capacity_heuristic, CooMatrix, CsrMatrix, EllMatrix, HybMatrix, MatrixShape};
pub use matrix::{spmm_csr_serial, spmv_csr_serial};
pub use memory::{allocate, copy_array, free, LocatedArray, MemoryLocation};
pub use utils::{from_sprs_csr, read_matrix_market, to_sprs_csr};
pub use verify::{maximum_relative_error, test_spmm_ell_kernel, ErrorSummary, VerificationReport};

/// Version information for the ellspmm library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
