//! Seeded random sparse matrix generators
//!
//! Used by the CLI driver, the benches and the tests. Every generator is
//! driven by a `ChaCha8Rng`, so the same seed always gives the same matrix.

use std::collections::BTreeSet;

use rand::distributions::{Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, MatrixShape};
use crate::memory::LocatedArray;

/// Generates square random CSR matrices
pub struct MatrixGenerator {
    rng: ChaCha8Rng,
}

impl MatrixGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Matrix with a uniformly random row length in `1..=2 * avg_nnz`
    ///
    /// Columns within a row are distinct and sorted; values are uniform in
    /// [-10, 10).
    pub fn random(&mut self, n: usize, avg_nnz: usize) -> Result<CsrMatrix<f64>> {
        if n == 0 {
            return Ok(CsrMatrix::zeros(0, 0));
        }
        if avg_nnz == 0 {
            return Err(Error::InvalidMatrix(
                "average row length must be positive".to_string(),
            ));
        }

        let nnz_dist = Uniform::from(1..=(avg_nnz * 2).min(n));
        let lengths: Vec<usize> = (0..n).map(|_| nnz_dist.sample(&mut self.rng)).collect();
        self.with_row_lengths(n, &lengths)
    }

    /// Banded matrix holding every entry within `bandwidth / 2` of the diagonal
    pub fn banded(&mut self, n: usize, bandwidth: usize) -> Result<CsrMatrix<f64>> {
        let mut row_ptr = vec![0];
        let mut col_index = Vec::new();
        let mut values = Vec::new();

        let val_dist = Uniform::from(-10.0..10.0);

        for i in 0..n {
            let col_start = i.saturating_sub(bandwidth / 2);
            let col_end = (i + bandwidth / 2 + 1).min(n);

            for j in col_start..col_end {
                col_index.push(j);
                values.push(val_dist.sample(&mut self.rng));
            }

            row_ptr.push(col_index.len());
        }

        CsrMatrix::new(n, n, row_ptr, col_index, values)
    }

    /// Scale-free matrix: row lengths follow `n * i^-alpha`, shuffled
    ///
    /// A few long rows next to many short ones, the worst case for ELL
    /// padding.
    pub fn power_law(&mut self, n: usize, alpha: f64) -> Result<CsrMatrix<f64>> {
        let mut lengths: Vec<usize> = (1..=n)
            .map(|i| (((i as f64).powf(-alpha) * n as f64) as usize).clamp(1, n))
            .collect();
        lengths.shuffle(&mut self.rng);

        self.with_row_lengths(n, &lengths)
    }

    fn with_row_lengths(&mut self, n: usize, lengths: &[usize]) -> Result<CsrMatrix<f64>> {
        let mut row_ptr = Vec::with_capacity(n + 1);
        row_ptr.push(0);
        let total: usize = lengths.iter().sum();
        let mut col_index = Vec::with_capacity(total);
        let mut values = Vec::with_capacity(total);

        let val_dist = Uniform::from(-10.0..10.0);

        for &row_nnz in lengths {
            let mut row_cols = BTreeSet::new();
            while row_cols.len() < row_nnz {
                row_cols.insert(self.rng.gen_range(0..n));
            }

            for col in row_cols {
                col_index.push(col);
                values.push(val_dist.sample(&mut self.rng));
            }

            row_ptr.push(col_index.len());
        }

        CsrMatrix::new(n, n, row_ptr, col_index, values)
    }
}

/// Tridiagonal matrix with 2 on the diagonal and -1 beside it
pub fn tridiagonal(n: usize) -> CsrMatrix<f64> {
    let mut row_ptr = vec![0];
    let mut col_index = Vec::new();
    let mut values = Vec::new();

    for i in 0..n {
        if i > 0 {
            col_index.push(i - 1);
            values.push(-1.0);
        }

        col_index.push(i);
        values.push(2.0);

        if i < n - 1 {
            col_index.push(i + 1);
            values.push(-1.0);
        }

        row_ptr.push(col_index.len());
    }

    CsrMatrix {
        shape: MatrixShape::new(n, n, col_index.len()),
        row_ptr: LocatedArray::from_vec(row_ptr),
        col_index: LocatedArray::from_vec(col_index),
        values: LocatedArray::from_vec(values),
    }
}
