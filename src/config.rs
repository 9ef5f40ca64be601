//! Configuration for the device, the kernels and the harnesses

use crate::constants::*;
use crate::kernel::FetchMode;

/// System parameters for the simulated device
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Number of device worker threads
    pub n_threads: usize,
    /// Rows handled by one device task
    pub block_size: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
            block_size: DEVICE_BLOCK_SIZE,
        }
    }
}

/// Configuration for SpMM execution
#[derive(Debug, Clone, Default)]
pub struct SpmmConfig {
    /// Device parameters
    pub system_params: SystemParameters,

    /// How kernels read the dense X block
    pub fetch_mode: FetchMode,
}

impl SpmmConfig {
    /// Default configuration with overrides from the environment
    ///
    /// `ELLSPMM_THREADS` sets the device thread count and `ELLSPMM_FETCH`
    /// selects `direct` or `cached` X reads. Unparseable values are ignored
    /// with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(threads) = std::env::var(ENV_THREADS) {
            match threads.parse::<usize>() {
                Ok(n) if n > 0 => config.system_params.n_threads = n,
                _ => log::warn!("ignoring {}={:?}", ENV_THREADS, threads),
            }
        }

        if let Ok(mode) = std::env::var(ENV_FETCH) {
            match mode.parse::<FetchMode>() {
                Ok(mode) => config.fetch_mode = mode,
                Err(_) => log::warn!("ignoring {}={:?}", ENV_FETCH, mode),
            }
        }

        config
    }

    /// Configuration with a fixed thread count
    pub fn with_threads(n_threads: usize) -> Self {
        Self {
            system_params: SystemParameters {
                n_threads,
                ..SystemParameters::default()
            },
            ..Self::default()
        }
    }
}

/// Parameters of a benchmark or verification sweep
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Lower bound on kernel dispatches per width
    pub min_iterations: usize,
    /// Upper bound on kernel dispatches per width
    pub max_iterations: usize,
    /// Vector counts to sweep
    pub widths: Vec<usize>,
    /// Seed for the random X and Y blocks
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            min_iterations: DEFAULT_MIN_ITERATIONS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            widths: SWEEP_WIDTHS.to_vec(),
            seed: DEFAULT_SEED,
        }
    }
}

impl BenchmarkConfig {
    /// Configuration running exactly `iterations` dispatches per width
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            min_iterations: iterations,
            max_iterations: iterations,
            ..Self::default()
        }
    }

    /// Dispatches per width: the upper bound, but never below the lower bound
    pub fn num_iterations(&self) -> usize {
        self.max_iterations.max(self.min_iterations).max(1)
    }
}
