//! Property tests for the conversion and the kernels

use proptest::prelude::*;

use ellspmm::{
    csr_to_ell, spmm_csr_serial, spmm_ell, CsrMatrix, Device, Error, FetchMode, LocatedArray, MemoryLocation,
};

// ============================================================================
// STRATEGIES
// ============================================================================

/// Random CSR matrix: up to 40 x 40, rows with 0..=8 distinct sorted columns
fn arb_csr() -> impl Strategy<Value = CsrMatrix<f64>> {
    (1usize..40, 1usize..40).prop_flat_map(|(num_rows, num_cols)| {
        let max_len = num_cols.min(8);
        let row = prop::collection::btree_set(0..num_cols, 0..=max_len);
        (
            Just(num_rows),
            Just(num_cols),
            prop::collection::vec(row, num_rows),
            prop::collection::vec(-4i32..=4, num_rows * max_len),
        )
            .prop_map(|(num_rows, num_cols, rows, ints)| {
                let mut row_ptr = vec![0];
                let mut col_index = Vec::new();
                for cols in rows {
                    col_index.extend(cols);
                    row_ptr.push(col_index.len());
                }
                // Small integers keep every sum exact
                let values = ints.iter().take(col_index.len()).map(|&v| v as f64).collect();
                CsrMatrix::new(num_rows, num_cols, row_ptr, col_index, values).unwrap()
            })
    })
}

fn pattern_block(len: usize, salt: usize) -> Vec<f64> {
    (0..len).map(|k| ((k * 31 + salt) % 11) as f64 - 5.0).collect()
}

fn device() -> Device {
    Device::with_threads(2).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// ELL back to CSR gives the same rows in the same order
    #[test]
    fn prop_conversion_round_trip(csr in arb_csr()) {
        let ell = csr_to_ell(&csr, csr.max_row_len()).unwrap();
        let back = ell.to_csr().unwrap();

        prop_assert_eq!(back.shape, csr.shape);
        prop_assert_eq!(back.row_ptr.as_slice(), csr.row_ptr.as_slice());
        prop_assert_eq!(back.col_index.as_slice(), csr.col_index.as_slice());
        prop_assert_eq!(back.values.as_slice(), csr.values.as_slice());
        prop_assert_eq!(ell.stride % 32, 0);
        prop_assert!(ell.stride >= csr.shape.num_rows);
    }

    /// A bound below the longest row always fails and names that row's length
    #[test]
    fn prop_capacity_rejection(csr in arb_csr()) {
        let longest = csr.max_row_len();
        prop_assume!(longest > 0);

        match csr_to_ell(&csr, longest - 1) {
            Err(Error::CapacityExceeded { row, row_nonzeros, max_cols_per_row }) => {
                prop_assert!(row_nonzeros > max_cols_per_row);
                prop_assert_eq!(csr.row_len(row), row_nonzeros);
                prop_assert!((0..row).all(|i| csr.row_len(i) < longest));
            }
            other => prop_assert!(false, "expected capacity error, got {:?}", other.err()),
        }
    }

    /// Extra padding slots never change the product
    #[test]
    fn prop_padding_is_neutral(csr in arb_csr(), extra in 1usize..6) {
        let device = device();
        let ell = csr_to_ell(&csr, csr.max_row_len()).unwrap();
        let padded = ell.with_extra_padding(extra);

        let (m, n) = (csr.shape.num_rows, csr.shape.num_cols);
        let x = LocatedArray::from_vec(pattern_block(n * 4, 1));
        let mut y1 = LocatedArray::from_vec(pattern_block(m * 4, 2));
        let mut y2 = y1.clone();

        spmm_ell(&device, &ell, &x, &mut y1, 4, 4, FetchMode::Direct).unwrap();
        spmm_ell(&device, &padded, &x, &mut y2, 4, 4, FetchMode::Direct).unwrap();

        prop_assert_eq!(y1.to_vec(), y2.to_vec());
    }

    /// Device SpMM equals the serial CSR reference for any block split
    #[test]
    fn prop_spmm_matches_reference(csr in arb_csr(), split in 0usize..4) {
        let device = device();
        let (m, n) = (csr.shape.num_rows, csr.shape.num_cols);
        let vec_block = [1, 2, 4, 8][split];
        let num_vectors = 8;

        let x_host = pattern_block(n * num_vectors, 3);
        let y_host = pattern_block(m * num_vectors, 4);
        let mut expected = y_host.clone();
        spmm_csr_serial(&csr, &x_host, &mut expected, num_vectors).unwrap();

        let ell = csr_to_ell(&csr, csr.max_row_len()).unwrap().to_location(MemoryLocation::Device).unwrap();
        let x = LocatedArray::from_slice(&x_host, MemoryLocation::Device).unwrap();
        let mut y = LocatedArray::from_slice(&y_host, MemoryLocation::Device).unwrap();
        spmm_ell(&device, &ell, &x, &mut y, num_vectors, vec_block, FetchMode::Cached).unwrap();

        prop_assert_eq!(y.to_vec(), expected);
    }
}
