//! Centralized constants for the ellspmm library
//!
//! All hardcoded tuning values live here rather than being scattered
//! throughout the code. Constants are grouped by the component that uses them.

// ============================================================================
// MEMORY LOCATION CONSTANTS
// ============================================================================

/// Byte alignment of device allocations (one device memory transaction)
pub const DEVICE_ALIGNMENT: usize = 128;

// ============================================================================
// ELL FORMAT CONSTANTS
// ============================================================================

/// Column index stored in ELL padding slots
pub const ELL_PADDING: usize = usize::MAX;

/// ELL stride is `num_rows` rounded up to a multiple of this many rows
pub const ELL_STRIDE_ALIGNMENT: usize = 32;

/// Multiplier on the average row length used for the ELL capacity bound
pub const ELL_CAPACITY_FACTOR: usize = 3;

// ============================================================================
// KERNEL CONSTANTS
// ============================================================================

/// Vector block widths that have a specialized kernel
pub const SUPPORTED_WIDTHS: &[usize] = &[1, 2, 3, 4, 5, 6, 8, 10, 16, 32];

/// Rows handled by one device task (one "thread block")
pub const DEVICE_BLOCK_SIZE: usize = 256;

// ============================================================================
// BENCHMARK CONSTANTS
// ============================================================================

/// Vector block widths swept by the benchmark and verification harnesses
pub const SWEEP_WIDTHS: &[usize] = &[2, 4, 8, 16, 32];

/// Lower bound on kernel dispatch iterations per width
pub const DEFAULT_MIN_ITERATIONS: usize = 1;

/// Upper bound on kernel dispatch iterations per width
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Seed for the harness random number generators
pub const DEFAULT_SEED: u64 = 42;

/// Multiplier on sqrt(machine epsilon) for the relative error threshold
pub const RELATIVE_ERROR_FACTOR: f64 = 5.0;

// ============================================================================
// ENVIRONMENT VARIABLES
// ============================================================================

/// Overrides the device thread count
pub const ENV_THREADS: &str = "ELLSPMM_THREADS";

/// Selects the X fetch mode (`direct` or `cached`)
pub const ENV_FETCH: &str = "ELLSPMM_FETCH";
