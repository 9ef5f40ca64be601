//! Throughput benchmark for ELL SpMM kernels
//!
//! For each vector count in the sweep the harness stages a random X block
//! and a zero Y block at the requested location, runs a fixed number of
//! kernel dispatches and reports time per dispatch, GFLOP/s and GB/s.

use std::fmt;
use std::mem::size_of;
use std::time::Instant;

use ndarray::{Array2, ShapeBuilder};
use num_traits::Float;
use rand::distributions::{Distribution, Standard};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::BenchmarkConfig;
use crate::device::Device;
use crate::error::Result;
use crate::kernel::SpmmKernel;
use crate::matrix::{csr_to_ell, ell_capacity_heuristic, CsrMatrix, EllMatrix};
use crate::memory::{allocate, LocatedArray, MemoryLocation};

/// Bytes moved by one width-1 pass over `ell`
///
/// Column indices and x reads count once per stored entry, the value array
/// counts in full including padding, and y is read and written once per row.
pub fn bytes_per_spmm<T>(ell: &EllMatrix<T>) -> usize {
    let nnz = ell.shape.num_nonzeros;
    size_of::<usize>() * nnz
        + size_of::<T>() * ell.stride * ell.num_cols_per_row
        + size_of::<T>() * nnz
        + 2 * size_of::<T>() * ell.shape.num_rows
}

/// Timing results for one vector count
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    /// Kernel name shown in the report
    pub method_name: String,
    /// Where the matrix and blocks lived
    pub location: MemoryLocation,
    /// Vectors multiplied per dispatch
    pub num_vectors: usize,
    /// Timed dispatches
    pub num_iterations: usize,
    /// Mean time per dispatch
    pub msec_per_iteration: f64,
    /// `2 * nnz * num_vectors` flops per dispatch, in GFLOP/s
    pub gflops: f64,
    /// [`bytes_per_spmm`] per dispatch, in GB/s
    pub gbytes: f64,
}

impl BenchmarkReport {
    fn new<T>(
        method_name: &str,
        location: MemoryLocation,
        ell: &EllMatrix<T>,
        num_vectors: usize,
        num_iterations: usize,
        elapsed_secs: f64,
    ) -> Self {
        let sec_per_iteration = elapsed_secs / num_iterations as f64;
        let (gflops, gbytes) = if sec_per_iteration == 0.0 {
            (0.0, 0.0)
        } else {
            let flops = 2.0 * num_vectors as f64 * ell.shape.num_nonzeros as f64;
            (
                flops / sec_per_iteration / 1e9,
                bytes_per_spmm(ell) as f64 / sec_per_iteration / 1e9,
            )
        };

        Self {
            method_name: method_name.to_string(),
            location,
            num_vectors,
            num_iterations,
            msec_per_iteration: sec_per_iteration * 1000.0,
            gflops,
            gbytes,
        }
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\tbenchmarking {:<20} [{}]: {:8.4} ms ( {:5.2} GFLOP/s)",
            self.method_name, self.location, self.msec_per_iteration, self.gflops
        )?;
        write!(
            f,
            "\tbenchmarking {:<20} [{}]: ( {:5.2} Gbytes/s)",
            self.method_name, self.location, self.gbytes
        )
    }
}

/// Random dense block of `rows x cols` entries in [0, 1), column-major
pub(crate) fn random_block<T>(rng: &mut ChaCha8Rng, rows: usize, cols: usize) -> Vec<T>
where
    T: Float,
    Standard: Distribution<T>,
{
    Array2::from_shape_fn((rows, cols).f(), |_| rng.gen::<T>()).into_raw_vec()
}

/// Benchmarks `kernel` on `csr` for every vector count in `config.widths`
///
/// The ELL bound comes from [`ell_capacity_heuristic`]; a matrix that does
/// not fit aborts the run with [`crate::Error::CapacityExceeded`] before any
/// timing starts. Each width runs `config.num_iterations()` dispatches with
/// one launch covering all vectors, followed by a device barrier.
pub fn benchmark_ell<T, K>(
    device: &Device,
    csr: &CsrMatrix<T>,
    kernel: &K,
    location: MemoryLocation,
    method_name: &str,
    config: &BenchmarkConfig,
) -> Result<Vec<BenchmarkReport>>
where
    T: Float + Send + Sync,
    Standard: Distribution<T>,
    K: SpmmKernel<T>,
{
    let max_cols_per_row = ell_capacity_heuristic(csr);
    let ell = csr_to_ell(csr, max_cols_per_row).map_err(|e| {
        log::warn!("{}: {}", method_name, e);
        e
    })?;
    let ell_loc = ell.to_location(location)?;

    let num_rows = csr.shape.num_rows;
    let num_cols = csr.shape.num_cols;
    let num_iterations = config.num_iterations();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut reports = Vec::with_capacity(config.widths.len());

    for &num_vectors in &config.widths {
        println!("###   Testing the performance of SpMM using ELL   ###");
        println!("Number of vectors {}", num_vectors);

        let x_host = random_block::<T>(&mut rng, num_cols, num_vectors);
        let x = LocatedArray::from_slice(&x_host, location)?;
        let mut y = allocate::<T>(num_rows * num_vectors, location)?;

        let start = Instant::now();
        for _ in 0..num_iterations {
            kernel.spmm(device, &ell_loc, &x, &mut y, num_vectors, num_vectors)?;
        }
        device.synchronize();
        let elapsed = start.elapsed().as_secs_f64();

        let report = BenchmarkReport::new(method_name, location, &ell, num_vectors, num_iterations, elapsed);
        println!("{}", report);
        log::debug!(
            "{} x{}: {} iterations in {:.3} s",
            method_name,
            num_vectors,
            num_iterations,
            elapsed
        );
        reports.push(report);
    }

    Ok(reports)
}

/// [`benchmark_ell`] with every operand staged in device memory
pub fn benchmark_ell_on_device<T, K>(
    device: &Device,
    csr: &CsrMatrix<T>,
    kernel: &K,
    method_name: &str,
    config: &BenchmarkConfig,
) -> Result<Vec<BenchmarkReport>>
where
    T: Float + Send + Sync,
    Standard: Distribution<T>,
    K: SpmmKernel<T>,
{
    benchmark_ell(device, csr, kernel, MemoryLocation::Device, method_name, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::EllSpmm;
    use crate::Error;

    #[test]
    fn test_bytes_per_spmm() {
        let csr = CsrMatrix::<f64>::identity(4);
        let ell = csr_to_ell(&csr, 1).unwrap();

        // 8*4 index + 8*32*1 values + 8*4 x + 2*8*4 y
        assert_eq!(bytes_per_spmm(&ell), 32 + 256 + 32 + 64);
    }

    #[test]
    fn test_zero_time_gives_zero_rates() {
        let ell = csr_to_ell(&CsrMatrix::<f64>::identity(4), 1).unwrap();
        let report = BenchmarkReport::new("ell", MemoryLocation::Device, &ell, 4, 10, 0.0);

        assert_eq!(report.gflops, 0.0);
        assert_eq!(report.gbytes, 0.0);
        assert_eq!(report.msec_per_iteration, 0.0);
    }

    #[test]
    fn test_rates() {
        let ell = csr_to_ell(&CsrMatrix::<f64>::identity(4), 1).unwrap();
        let report = BenchmarkReport::new("ell", MemoryLocation::Host, &ell, 2, 4, 2.0);

        assert_eq!(report.msec_per_iteration, 500.0);
        assert!((report.gflops - 2.0 * 2.0 * 4.0 / 0.5 / 1e9).abs() < 1e-18);
        assert!(report.to_string().contains("[cpu]"));
    }

    #[test]
    fn test_random_block_is_seeded() {
        let a = random_block::<f64>(&mut ChaCha8Rng::seed_from_u64(5), 3, 2);
        let b = random_block::<f64>(&mut ChaCha8Rng::seed_from_u64(5), 3, 2);

        assert_eq!(a.len(), 6);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_benchmark_sweep() {
        let device = Device::with_threads(2).unwrap();
        let csr = crate::generate::tridiagonal(64);
        let config = BenchmarkConfig {
            widths: vec![2, 4],
            ..BenchmarkConfig::with_iterations(3)
        };

        let reports = benchmark_ell_on_device(&device, &csr, &EllSpmm::direct(), "ell", &config).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].num_vectors, 4);
        assert_eq!(reports[0].num_iterations, 3);
        assert_eq!(reports[0].location, MemoryLocation::Device);
    }

    #[test]
    fn test_capacity_error_aborts() {
        let device = Device::with_threads(1).unwrap();
        // One full row of 16 among 15 empty rows: bound is 3*16/16+1 = 4
        let mut row_ptr = vec![0; 17];
        for p in row_ptr.iter_mut().skip(1) {
            *p = 16;
        }
        let csr = CsrMatrix::new(16, 16, row_ptr, (0..16).collect(), vec![1.0f64; 16]).unwrap();

        let err = benchmark_ell(
            &device,
            &csr,
            &EllSpmm::direct(),
            MemoryLocation::Host,
            "ell",
            &BenchmarkConfig::with_iterations(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { row: 0, .. }));
    }
}
