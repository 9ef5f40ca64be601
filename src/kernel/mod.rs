//! Multi-vector ELL SpMM kernels and the width dispatcher
//!
//! Dense blocks are column-major: vector `k` of an X block occupies
//! `x[k * num_cols .. (k + 1) * num_cols]` and vector `k` of a Y block
//! occupies `y[k * num_rows .. (k + 1) * num_rows]`.
//!
//! [`spmm_ell`] covers `num_vectors` vectors with launches of `vec_block`
//! vectors each. Every launch runs the kernel instantiated for exactly that
//! width; widths without an instantiation are rejected up front.

pub mod ell;
pub mod fetch;

use num_traits::Num;

use crate::constants::SUPPORTED_WIDTHS;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::matrix::EllMatrix;
use crate::memory::LocatedArray;

use self::ell::{spmm_ell_block, EllView};
use self::fetch::{CachedFetch, DirectFetch, Fetch};

pub use fetch::FetchMode;

/// Whether a specialized kernel exists for `width` vectors per launch
pub fn is_supported_width(width: usize) -> bool {
    SUPPORTED_WIDTHS.contains(&width)
}

/// Computes Y += A * X for `num_vectors` vectors, `vec_block` vectors per launch
///
/// The matrix and both blocks must live in the same memory location. On
/// device memory each launch runs row-parallel in the device pool; on host
/// memory it runs serially on the calling thread. Every launch completes
/// before the next one starts, so repeated calls keep accumulating into `y`.
///
/// # Errors
///
/// - [`Error::UnsupportedWidth`] if `vec_block` has no specialized kernel
/// - [`Error::RaggedVectorBlock`] if `num_vectors` is not a multiple of `vec_block`
/// - [`Error::DimensionMismatch`] if `x`, `y` or the ELL slot arrays are too short
/// - [`Error::InvalidMatrix`] if the ELL stride is smaller than the row count
/// - [`Error::LocationMismatch`] if the operands live in different locations
pub fn spmm_ell<T>(
    device: &Device,
    ell: &EllMatrix<T>,
    x: &LocatedArray<T>,
    y: &mut LocatedArray<T>,
    num_vectors: usize,
    vec_block: usize,
    mode: FetchMode,
) -> Result<()>
where
    T: Copy + Num + Send + Sync,
{
    if !is_supported_width(vec_block) {
        return Err(Error::UnsupportedWidth {
            width: vec_block,
            supported: SUPPORTED_WIDTHS,
        });
    }
    if num_vectors % vec_block != 0 {
        return Err(Error::RaggedVectorBlock {
            num_vectors,
            vec_block,
        });
    }

    let location = ell.location();
    ell.col_index.expect_location("ELL column indices", location)?;
    x.expect_location("X block", location)?;
    y.expect_location("Y block", location)?;

    let num_rows = ell.shape.num_rows;
    let num_cols = ell.shape.num_cols;
    check_len("X block", x.len(), num_cols * num_vectors)?;
    check_len("Y block", y.len(), num_rows * num_vectors)?;
    if ell.stride < num_rows {
        return Err(Error::InvalidMatrix(format!(
            "ELL stride {} is smaller than the {} rows",
            ell.stride, num_rows
        )));
    }
    check_len("ELL values", ell.values.len(), ell.num_slots())?;
    check_len("ELL column indices", ell.col_index.len(), ell.num_slots())?;

    match mode {
        FetchMode::Direct => {
            dispatch::<T, DirectFetch>(device, ell, x.as_slice(), y.as_mut_slice(), num_vectors, vec_block)
        }
        FetchMode::Cached => {
            dispatch::<T, CachedFetch>(device, ell, x.as_slice(), y.as_mut_slice(), num_vectors, vec_block)
        }
    }

    Ok(())
}

fn dispatch<T, F>(
    device: &Device,
    ell: &EllMatrix<T>,
    x: &[T],
    y: &mut [T],
    num_vectors: usize,
    vec_block: usize,
) where
    T: Copy + Num + Send + Sync,
    F: Fetch,
{
    let num_rows = ell.shape.num_rows;
    let num_cols = ell.shape.num_cols;
    let location = ell.location();
    let view = EllView::new(ell);

    for offset in (0..num_vectors).step_by(vec_block) {
        let xs = &x[offset * num_cols..(offset + vec_block) * num_cols];
        let ys = &mut y[offset * num_rows..(offset + vec_block) * num_rows];

        match vec_block {
            1 => spmm_ell_block::<T, F, 1>(device, location, view, num_rows, xs, ys),
            2 => spmm_ell_block::<T, F, 2>(device, location, view, num_rows, xs, ys),
            3 => spmm_ell_block::<T, F, 3>(device, location, view, num_rows, xs, ys),
            4 => spmm_ell_block::<T, F, 4>(device, location, view, num_rows, xs, ys),
            5 => spmm_ell_block::<T, F, 5>(device, location, view, num_rows, xs, ys),
            6 => spmm_ell_block::<T, F, 6>(device, location, view, num_rows, xs, ys),
            8 => spmm_ell_block::<T, F, 8>(device, location, view, num_rows, xs, ys),
            10 => spmm_ell_block::<T, F, 10>(device, location, view, num_rows, xs, ys),
            16 => spmm_ell_block::<T, F, 16>(device, location, view, num_rows, xs, ys),
            32 => spmm_ell_block::<T, F, 32>(device, location, view, num_rows, xs, ys),
            _ => unreachable!("width {} passed validation", vec_block),
        }
    }
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

/// A multi-vector SpMM routine the harnesses can drive
///
/// Closures with the signature of [`spmm_ell`] minus the fetch mode
/// implement this trait, so ad-hoc kernels can be benchmarked too.
pub trait SpmmKernel<T> {
    /// Computes Y += A * X for `num_vectors` vectors in blocks of `vec_block`
    fn spmm(
        &self,
        device: &Device,
        ell: &EllMatrix<T>,
        x: &LocatedArray<T>,
        y: &mut LocatedArray<T>,
        num_vectors: usize,
        vec_block: usize,
    ) -> Result<()>;
}

impl<T, K> SpmmKernel<T> for K
where
    K: Fn(&Device, &EllMatrix<T>, &LocatedArray<T>, &mut LocatedArray<T>, usize, usize) -> Result<()>,
{
    fn spmm(
        &self,
        device: &Device,
        ell: &EllMatrix<T>,
        x: &LocatedArray<T>,
        y: &mut LocatedArray<T>,
        num_vectors: usize,
        vec_block: usize,
    ) -> Result<()> {
        self(device, ell, x, y, num_vectors, vec_block)
    }
}

/// The ELL kernel family with a fixed fetch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EllSpmm {
    /// Read path for the X block
    pub mode: FetchMode,
}

impl EllSpmm {
    /// Kernels using plain X reads
    pub fn direct() -> Self {
        Self {
            mode: FetchMode::Direct,
        }
    }

    /// Kernels using the cached X read path
    pub fn cached() -> Self {
        Self {
            mode: FetchMode::Cached,
        }
    }

    /// Name used in reports
    pub fn name(&self) -> &'static str {
        self.mode.kernel_name()
    }
}

impl<T> SpmmKernel<T> for EllSpmm
where
    T: Copy + Num + Send + Sync,
{
    fn spmm(
        &self,
        device: &Device,
        ell: &EllMatrix<T>,
        x: &LocatedArray<T>,
        y: &mut LocatedArray<T>,
        num_vectors: usize,
        vec_block: usize,
    ) -> Result<()> {
        spmm_ell(device, ell, x, y, num_vectors, vec_block, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{csr_to_ell, CsrMatrix};
    use crate::memory::MemoryLocation;

    fn identity_on_device(n: usize) -> EllMatrix<f64> {
        let csr = CsrMatrix::<f64>::identity(n);
        csr_to_ell(&csr, 1)
            .unwrap()
            .to_location(MemoryLocation::Device)
            .unwrap()
    }

    #[test]
    fn test_unsupported_width_is_an_error() {
        let device = Device::with_threads(1).unwrap();
        let ell = identity_on_device(4);
        let x = LocatedArray::from_slice(&[1.0; 28], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0; 28], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 7, 7, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::UnsupportedWidth { width: 7, .. }));
        assert!(y.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_ragged_vector_block() {
        let device = Device::with_threads(1).unwrap();
        let ell = identity_on_device(4);
        let x = LocatedArray::from_slice(&[1.0; 24], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0; 24], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 6, 4, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::RaggedVectorBlock { num_vectors: 6, vec_block: 4 }));
    }

    #[test]
    fn test_location_mismatch() {
        let device = Device::with_threads(1).unwrap();
        let ell = identity_on_device(4);
        let x = LocatedArray::from_vec(vec![1.0; 8]);
        let mut y = LocatedArray::from_slice(&[0.0; 8], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 2, 2, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::LocationMismatch { what: "X block", .. }));
    }

    #[test]
    fn test_short_y_block() {
        let device = Device::with_threads(1).unwrap();
        let ell = identity_on_device(4);
        let x = LocatedArray::from_slice(&[1.0; 8], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0; 7], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 2, 2, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { what: "Y block", .. }));
    }

    #[test]
    fn test_stride_below_row_count() {
        let device = Device::with_threads(1).unwrap();
        let mut ell = identity_on_device(4);
        ell.stride = 2;
        let x = LocatedArray::from_slice(&[1.0; 4], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0; 4], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 1, 1, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::InvalidMatrix(_)));
        assert!(y.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_short_column_indices() {
        let device = Device::with_threads(1).unwrap();
        let mut ell = identity_on_device(4);
        ell.col_index = LocatedArray::from_slice(&[0usize, 1], MemoryLocation::Device).unwrap();
        let x = LocatedArray::from_slice(&[1.0; 4], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0; 4], MemoryLocation::Device).unwrap();

        let err = spmm_ell(&device, &ell, &x, &mut y, 1, 1, FetchMode::Direct).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { what: "ELL column indices", .. }));
    }

    #[test]
    fn test_blocks_advance_through_vectors() {
        let device = Device::with_threads(2).unwrap();
        let ell = identity_on_device(3);
        let host_x: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let x = LocatedArray::from_slice(&host_x, MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[1.0; 12], MemoryLocation::Device).unwrap();

        spmm_ell(&device, &ell, &x, &mut y, 4, 2, FetchMode::Cached).unwrap();

        let expected: Vec<f64> = host_x.iter().map(|v| v + 1.0).collect();
        assert_eq!(y.to_vec(), expected);
    }

    #[test]
    fn test_closure_kernel() {
        let device = Device::with_threads(1).unwrap();
        let ell = identity_on_device(2);
        let x = LocatedArray::from_slice(&[2.0, 3.0], MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&[0.0, 0.0], MemoryLocation::Device).unwrap();

        let kernel = |device: &Device,
                      ell: &EllMatrix<f64>,
                      x: &LocatedArray<f64>,
                      y: &mut LocatedArray<f64>,
                      n: usize,
                      b: usize| spmm_ell(device, ell, x, y, n, b, FetchMode::Direct);
        kernel.spmm(&device, &ell, &x, &mut y, 1, 1).unwrap();

        assert_eq!(y.to_vec(), vec![2.0, 3.0]);
        assert_eq!(EllSpmm::cached().name(), "ell_tex");
    }
}
