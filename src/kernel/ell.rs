//! Register-blocked ELL SpMM kernel
//!
//! One kernel body serves every vector block width: `W` is a const generic,
//! so each instantiation keeps its `W` accumulators in a fixed-size array
//! the compiler can hold in registers and fully unroll.

use num_traits::Num;

use crate::constants::ELL_PADDING;
use crate::device::Device;
use crate::kernel::fetch::Fetch;
use crate::matrix::EllMatrix;
use crate::memory::MemoryLocation;

/// Borrowed view of the ELL arrays a launch reads
#[derive(Clone, Copy)]
pub(crate) struct EllView<'a, T> {
    pub num_cols: usize,
    pub num_cols_per_row: usize,
    pub stride: usize,
    pub col_index: &'a [usize],
    pub values: &'a [T],
}

impl<'a, T> EllView<'a, T> {
    pub fn new(ell: &'a EllMatrix<T>) -> Self {
        Self {
            num_cols: ell.shape.num_cols,
            num_cols_per_row: ell.num_cols_per_row,
            stride: ell.stride,
            col_index: ell.col_index.as_slice(),
            values: ell.values.as_slice(),
        }
    }
}

/// Accumulates row `row` of A times `W` columns of `x` into `acc`
///
/// Slots are visited in order; padding slots are skipped without touching
/// `x`. Column `k` of the block starts at `x[k * num_cols]`.
#[inline(always)]
fn ell_row<T, F, const W: usize>(m: &EllView<'_, T>, x: &[T], row: usize, acc: &mut [T; W])
where
    T: Copy + Num,
    F: Fetch,
{
    for n in 0..m.num_cols_per_row {
        let slot = row + n * m.stride;
        let col = m.col_index[slot];
        if col == ELL_PADDING {
            continue;
        }
        if n + 1 < m.num_cols_per_row {
            let next = m.col_index[slot + m.stride];
            if next != ELL_PADDING {
                F::prefetch(x, next);
            }
        }

        let a = m.values[slot];
        let mut idx = col;
        for sum in acc.iter_mut() {
            *sum = *sum + a * F::fetch(x, idx);
            idx += m.num_cols;
        }
    }
}

/// One kernel launch: y += A * x for a block of exactly `W` vectors
///
/// `x` holds `W * num_cols` entries and `y` holds `W * num_rows` entries,
/// both column-major. Rows are split into device blocks; each block owns
/// the disjoint pieces of the `W` output columns that cover its rows.
pub(crate) fn spmm_ell_block<T, F, const W: usize>(
    device: &Device,
    location: MemoryLocation,
    m: EllView<'_, T>,
    num_rows: usize,
    x: &[T],
    y: &mut [T],
) where
    T: Copy + Num + Send + Sync,
    F: Fetch,
{
    if num_rows == 0 {
        return;
    }

    let block_size = device.block_size();
    let num_blocks = num_rows.div_ceil(block_size);

    let mut tiles: Vec<Vec<&mut [T]>> = (0..num_blocks).map(|_| Vec::with_capacity(W)).collect();
    for column in y.chunks_mut(num_rows).take(W) {
        for (tile, piece) in tiles.iter_mut().zip(column.chunks_mut(block_size)) {
            tile.push(piece);
        }
    }

    device.launch(location, tiles, |block, mut tile| {
        let first_row = block * block_size;
        for local in 0..tile[0].len() {
            let mut acc = [T::zero(); W];
            for (sum, column) in acc.iter_mut().zip(tile.iter()) {
                *sum = column[local];
            }

            ell_row::<T, F, W>(&m, x, first_row + local, &mut acc);

            for (column, sum) in tile.iter_mut().zip(acc) {
                column[local] = sum;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::fetch::{CachedFetch, DirectFetch};
    use crate::matrix::{csr_to_ell, CsrMatrix};

    //    [1 2 0]
    //    [0 3 0]
    //    [4 0 5]
    fn sample_ell() -> EllMatrix<f64> {
        let csr = CsrMatrix::new(
            3,
            3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        csr_to_ell(&csr, 2).unwrap()
    }

    #[test]
    fn test_ell_row_two_vectors() {
        let ell = sample_ell();
        let m = EllView::new(&ell);
        let x = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0];

        let mut acc = [10.0, 0.0];
        ell_row::<f64, DirectFetch, 2>(&m, &x, 2, &mut acc);

        // Row 2 = [4 0 5]
        assert_eq!(acc, [10.0 + 9.0, 4.0 + 15.0]);
    }

    #[test]
    fn test_block_launch_on_host_and_device() {
        let ell = sample_ell();
        let device = Device::with_threads(2).unwrap();
        let x = [1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];

        for location in [MemoryLocation::Host, MemoryLocation::Device] {
            let mut y = vec![0.0; 9];
            spmm_ell_block::<f64, CachedFetch, 3>(&device, location, EllView::new(&ell), 3, &x, &mut y);
            assert_eq!(y, vec![5.0, 6.0, 19.0, 2.0, 3.0, 0.0, 1.0, 0.0, 4.0]);
        }
    }
}
