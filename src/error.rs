//! Error types for ellspmm

use crate::memory::MemoryLocation;
use thiserror::Error;

/// Result type alias using ellspmm's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting, staging or multiplying matrices
#[derive(Error, Debug)]
pub enum Error {
    /// A CSR row holds more nonzeros than the ELL per-row capacity
    #[error("row {row} has {row_nonzeros} nonzeros, exceeding ELL capacity of {max_cols_per_row}")]
    CapacityExceeded {
        /// First offending row
        row: usize,
        /// Nonzeros stored in that row
        row_nonzeros: usize,
        /// Capacity bound supplied to the conversion
        max_cols_per_row: usize,
    },

    /// Allocation of a located array failed
    #[error("failed to allocate {count} elements in {location:?} memory")]
    Allocation {
        /// Requested element count
        count: usize,
        /// Target location
        location: MemoryLocation,
    },

    /// No width-specialized kernel exists for the requested vector block
    #[error("no SpMM kernel for vector block width {width} (supported: {supported:?})")]
    UnsupportedWidth {
        /// Requested width
        width: usize,
        /// Widths with a specialized kernel
        supported: &'static [usize],
    },

    /// The vector count is not covered by whole vector blocks
    #[error("{num_vectors} vectors cannot be split into blocks of {vec_block}")]
    RaggedVectorBlock {
        /// Total vectors requested
        num_vectors: usize,
        /// Vectors per kernel launch
        vec_block: usize,
    },

    /// A buffer is shorter than the operation requires
    #[error("{what}: expected at least {expected} elements, got {got}")]
    DimensionMismatch {
        /// Which buffer was too short
        what: &'static str,
        /// Required length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Operands live in different memory locations
    #[error("{what} is in {got:?} memory, expected {expected:?}")]
    LocationMismatch {
        /// Which operand was misplaced
        what: &'static str,
        /// Location required by the operation
        expected: MemoryLocation,
        /// Location the operand lives in
        got: MemoryLocation,
    },

    /// Matrix arrays are structurally inconsistent
    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),

    /// The device worker pool could not be created
    #[error("failed to start device pool: {0}")]
    DevicePool(#[from] rayon::ThreadPoolBuildError),

    /// Reading a matrix file failed
    #[error("failed to read matrix: {0}")]
    Io(#[from] sprs::io::IoError),
}
