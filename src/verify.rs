//! Correctness check of ELL SpMM kernels against the serial CSR reference

use std::fmt;

use ndarray::{ArrayView2, Axis, ShapeBuilder};
use num_traits::Float;
use rand::distributions::{Distribution, Standard};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bench::random_block;
use crate::config::BenchmarkConfig;
use crate::constants::RELATIVE_ERROR_FACTOR;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::kernel::{is_supported_width, SpmmKernel};
use crate::matrix::{csr_to_ell, ell_capacity_heuristic, spmm_csr_serial, CsrMatrix};
use crate::memory::{LocatedArray, MemoryLocation};

/// Largest relative error still counted as a pass: 5 * sqrt(machine epsilon)
pub fn relative_error_threshold<T: Float>() -> T {
    T::from(RELATIVE_ERROR_FACTOR).unwrap_or_else(T::one) * T::epsilon().sqrt()
}

/// Result of comparing two column-major blocks entry by entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSummary<T> {
    /// Largest relative error
    pub max_error: T,
    /// `|a - b|` at the entry with the largest relative error
    pub max_absolute_error: T,
    /// Entries whose relative error exceeds the threshold
    pub num_errors: usize,
    /// Row of the largest relative error
    pub row: usize,
    /// Vector of the largest relative error
    pub vector: usize,
}

impl<T: Float> ErrorSummary<T> {
    /// Whether the largest relative error is within the threshold
    pub fn passed(&self) -> bool {
        self.max_error <= relative_error_threshold::<T>()
    }
}

/// Compares two `num_rows x num_vectors` column-major blocks
///
/// The relative error of an entry is `|a - b| / (|a| + |b| + sqrt(eps))`.
/// Entries that compare equal contribute nothing, as do pairs of NaNs. Any
/// other non-finite divergence counts as an error of infinite size. When
/// several entries share
/// the largest error, the one visited last (vector-major order) is reported.
pub fn maximum_relative_error<T: Float>(
    a: &[T],
    b: &[T],
    num_rows: usize,
    num_vectors: usize,
) -> Result<ErrorSummary<T>> {
    let a = block_view(a, num_rows, num_vectors)?;
    let b = block_view(b, num_rows, num_vectors)?;

    let eps = T::epsilon().sqrt();
    let threshold = relative_error_threshold::<T>();
    let mut summary = ErrorSummary {
        max_error: T::zero(),
        max_absolute_error: T::zero(),
        num_errors: 0,
        row: 0,
        vector: 0,
    };

    for (vector, (col_a, col_b)) in a.axis_iter(Axis(1)).zip(b.axis_iter(Axis(1))).enumerate() {
        for (row, (&x, &y)) in col_a.iter().zip(col_b.iter()).enumerate() {
            if x == y || (x.is_nan() && y.is_nan()) {
                continue;
            }

            let error = (x - y).abs();
            let relative = error / (x.abs() + y.abs() + eps);
            // NaN or an unmatched infinity on one side
            let relative = if relative.is_finite() { relative } else { T::infinity() };
            if relative > threshold {
                summary.num_errors += 1;
            }
            if relative >= summary.max_error {
                summary.max_error = relative;
                summary.max_absolute_error = error;
                summary.row = row;
                summary.vector = vector;
            }
        }
    }

    Ok(summary)
}

fn block_view<T>(values: &[T], num_rows: usize, num_vectors: usize) -> Result<ArrayView2<'_, T>> {
    let expected = num_rows * num_vectors;
    if values.len() < expected {
        return Err(Error::DimensionMismatch {
            what: "compared block",
            expected,
            got: values.len(),
        });
    }
    ArrayView2::from_shape((num_rows, num_vectors).f(), &values[..expected]).map_err(|_| {
        Error::DimensionMismatch {
            what: "compared block",
            expected,
            got: values.len(),
        }
    })
}

/// Outcome of one (vector count, block width) check
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport<T> {
    /// Vectors multiplied per call
    pub num_vectors: usize,
    /// Vectors per kernel launch
    pub vec_block: usize,
    /// ELL slots per row of the checked matrix
    pub num_cols_per_row: usize,
    /// Comparison against the CSR reference
    pub summary: ErrorSummary<T>,
}

impl<T: Float> VerificationReport<T> {
    /// Whether the comparison stayed within the threshold
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }
}

impl<T: Float + fmt::Display> fmt::Display for VerificationReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "number of errors = {}", self.summary.num_errors)?;
        writeln!(
            f,
            "location of maximum error= {} in vector {} error {:.6}",
            self.summary.row, self.summary.vector, self.summary.max_absolute_error
        )?;
        write!(f, "[max error {:9.6}]", self.summary.max_error)?;
        if !self.passed() {
            write!(f, " POSSIBLE FAILURE")?;
        }
        Ok(())
    }
}

/// Checks `kernel` against [`spmm_csr_serial`] on `csr`
///
/// For every vector count in `config.widths` and every supported power-of-two
/// block width from 2 up to that count, X and Y are filled with random values
/// in [0, 1). The reference runs on host copies; the kernel runs on device
/// copies of the same data, and its Y is copied back before comparing.
///
/// Accuracy failures are logged and reported, not returned as errors. A
/// matrix that does not fit the heuristic ELL bound fails with
/// [`Error::CapacityExceeded`].
pub fn test_spmm_ell_kernel<T, K>(
    device: &Device,
    csr: &CsrMatrix<T>,
    kernel: &K,
    config: &BenchmarkConfig,
) -> Result<Vec<VerificationReport<T>>>
where
    T: Float + Send + Sync + fmt::Display,
    Standard: Distribution<T>,
    K: SpmmKernel<T>,
{
    println!("\n####  Testing ELL SpMM Kernel ####");

    let num_rows = csr.shape.num_rows;
    let num_cols = csr.shape.num_cols;

    let max_cols_per_row = ell_capacity_heuristic(csr);
    let ell = match csr_to_ell(csr, max_cols_per_row) {
        Ok(ell) => ell,
        Err(e) => {
            println!(" {}", e);
            return Err(e);
        }
    };
    println!(" found {} num_cols_per_row", ell.num_cols_per_row);
    let ell_device = ell.to_location(MemoryLocation::Device)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut reports = Vec::new();

    for &num_vectors in &config.widths {
        let blocks = std::iter::successors(Some(2usize), |b| b.checked_mul(2))
            .take_while(|&b| b <= num_vectors)
            .filter(|&b| is_supported_width(b) && num_vectors % b == 0);

        for vec_block in blocks {
            let x_host = random_block::<T>(&mut rng, num_cols, num_vectors);
            let y_host = random_block::<T>(&mut rng, num_rows, num_vectors);

            let mut y_reference = y_host.clone();
            spmm_csr_serial(csr, &x_host, &mut y_reference, num_vectors)?;

            let x_device = LocatedArray::from_slice(&x_host, MemoryLocation::Device)?;
            let mut y_device = LocatedArray::from_slice(&y_host, MemoryLocation::Device)?;
            kernel.spmm(device, &ell_device, &x_device, &mut y_device, num_vectors, vec_block)?;
            let y_result = y_device.to_location(MemoryLocation::Host)?;

            let summary = maximum_relative_error(&y_reference, y_result.as_slice(), num_rows, num_vectors)?;
            let report = VerificationReport {
                num_vectors,
                vec_block,
                num_cols_per_row: ell.num_cols_per_row,
                summary,
            };

            println!("vectors {} in blocks of {}", num_vectors, vec_block);
            println!("{}", report);
            if !report.passed() {
                log::warn!(
                    "{} vectors in blocks of {}: max relative error {} at row {} of vector {}",
                    num_vectors,
                    vec_block,
                    summary.max_error,
                    summary.row,
                    summary.vector
                );
            }
            reports.push(report);
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::EllSpmm;

    #[test]
    fn test_identical_blocks() {
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let summary = maximum_relative_error(&a, &a, 2, 2).unwrap();

        assert_eq!(summary.max_error, 0.0);
        assert_eq!(summary.num_errors, 0);
        assert!(summary.passed());
    }

    #[test]
    fn test_locates_largest_error() {
        let a = vec![1.0f64, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut b = a.clone();
        b[1] = 1.0 + 1e-12;
        b[4] = 2.0;

        let summary = maximum_relative_error(&a, &b, 3, 2).unwrap();

        assert_eq!(summary.num_errors, 1);
        assert_eq!((summary.row, summary.vector), (1, 1));
        assert_eq!(summary.max_absolute_error, 1.0);
        assert!((summary.max_error - 1.0 / (3.0 + f64::EPSILON.sqrt())).abs() < 1e-15);
        assert!(!summary.passed());
    }

    #[test]
    fn test_small_errors_pass() {
        let a = vec![1.0f64; 4];
        let b = vec![1.0 + 1e-12; 4];
        let summary = maximum_relative_error(&a, &b, 4, 1).unwrap();

        assert_eq!(summary.num_errors, 0);
        assert!(summary.max_error > 0.0);
        assert!(summary.passed());
    }

    #[test]
    fn test_non_finite_results_fail() {
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let b = vec![1.0, f64::NAN, 3.0, f64::INFINITY];
        let summary = maximum_relative_error(&a, &b, 2, 2).unwrap();

        assert_eq!(summary.num_errors, 2);
        assert_eq!(summary.max_error, f64::INFINITY);
        assert_eq!((summary.row, summary.vector), (1, 1));
        assert!(!summary.passed());
    }

    #[test]
    fn test_matching_non_finite_entries() {
        let a = vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.0];
        let summary = maximum_relative_error(&a, &a.clone(), 4, 1).unwrap();
        assert_eq!(summary.num_errors, 0);
        assert!(summary.passed());

        let b = vec![f64::NAN, f64::NEG_INFINITY, f64::NEG_INFINITY, 1.0];
        let summary = maximum_relative_error(&a, &b, 4, 1).unwrap();
        assert_eq!(summary.num_errors, 1);
        assert_eq!(summary.row, 1);
    }

    #[test]
    fn test_short_block() {
        let err = maximum_relative_error(&[1.0f64; 3], &[1.0; 4], 2, 2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, got: 3, .. }));
    }

    #[test]
    fn test_threshold() {
        let expected = 5.0 * f64::EPSILON.sqrt();
        assert_eq!(relative_error_threshold::<f64>(), expected);
    }

    #[test]
    fn test_kernel_sweep_passes() {
        let device = Device::with_threads(2).unwrap();
        let csr = crate::generate::MatrixGenerator::new(9).random(300, 4).unwrap();
        let config = BenchmarkConfig {
            widths: vec![2, 8],
            ..BenchmarkConfig::default()
        };

        let reports = test_spmm_ell_kernel(&device, &csr, &EllSpmm::cached(), &config).unwrap();

        // 2 -> {2}, 8 -> {2, 4, 8}
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.passed()));
        assert_eq!(reports[3].vec_block, 8);
    }
}
