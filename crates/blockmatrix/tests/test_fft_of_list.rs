//! Tests for the batched Fourier transform over lists of block matrices.

use approx::assert_relative_eq;
use blockmatrix::{
    BlockMatrix, BlockMatrixError, BlockShapes, Validation, c64, fft_of_list, ifft_of_list,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::PI;

fn batch(n: usize, seed: u64) -> Vec<BlockMatrix<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shapes = BlockShapes::new([2, 1], [3, 2]);
    (0..n)
        .map(|_| BlockMatrix::randn_with_rng(&shapes, &mut rng))
        .collect()
}

/// Each output coordinate is the DFT of the input stack at that coordinate.
#[test]
fn test_fft_of_list_matches_stacked_dft() {
    for n in [3, 4] {
        let input = batch(n, 31 + n as u64);
        let output = fft_of_list(&input, Validation::Check).unwrap();
        assert_eq!(output.len(), n);

        let flat_in: Vec<_> = input.iter().map(|m| m.flatten()).collect();
        let flat_out: Vec<_> = output.iter().map(|m| m.flatten()).collect();
        let (nrows, ncols) = input[0].shape();
        for k in 0..n {
            assert_eq!(output[k].block_shapes(), input[0].block_shapes());
            for i in 0..nrows {
                for j in 0..ncols {
                    let expected = (0..n).fold(c64::new(0.0, 0.0), |acc, t| {
                        let angle = -2.0 * PI * (t * k) as f64 / n as f64;
                        acc + c64::new(angle.cos(), angle.sin()) * flat_in[t][(i, j)]
                    });
                    let got = flat_out[k][(i, j)];
                    assert_relative_eq!(got.re, expected.re, epsilon = 1e-10);
                    assert_relative_eq!(got.im, expected.im, epsilon = 1e-10);
                }
            }
        }
    }
}

/// The inverse transform recovers the inputs.
#[test]
fn test_ifft_of_list_round_trip() {
    let input = batch(5, 40);
    let back = ifft_of_list(&fft_of_list(&input, Validation::Check).unwrap(), Validation::Check)
        .unwrap();
    for (b, m) in back.iter().zip(&input) {
        for (z, x) in b.flatten().data().iter().zip(m.flatten().data()) {
            assert_relative_eq!(z.re, *x, epsilon = 1e-10);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-10);
        }
    }
}

/// A matrix with a different shape is rejected.
#[test]
fn test_fft_of_list_shape_mismatch() {
    let mut input = batch(2, 50);
    let mut rng = StdRng::seed_from_u64(51);
    input.push(BlockMatrix::randn_with_rng(&BlockShapes::new([2, 2], [3, 2]), &mut rng));
    let err = fft_of_list(&input, Validation::Check).unwrap_err();
    assert!(matches!(err, BlockMatrixError::BatchMismatch { index: 2, .. }));
}

/// Skipping the check still fails at the tree level when partitions differ.
#[test]
fn test_fft_of_list_skip_validation_partition_mismatch() {
    let mut input = batch(1, 60);
    let mut rng = StdRng::seed_from_u64(61);
    input.push(BlockMatrix::randn_with_rng(&BlockShapes::new([1, 2], [3, 2]), &mut rng));
    let err = fft_of_list(&input, Validation::Skip).unwrap_err();
    assert!(err.is_shape_error());
}
