//! Structural transforms: transpose and the batched Fourier transform.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::algebra::{distinct_slots, zip_map_trees};
use crate::block_matrix::{Block, BlockMatrix, Slot, Validation};
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::scalar::{Element, Scalar, c64};
use crate::spectral::dft_in_place;

impl<T: Element> BlockMatrix<T> {
    /// Transpose the grid and every block in it.
    ///
    /// A slot shared by several positions is transposed once, and the
    /// result is shared at the mirrored positions.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let a = DenseMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
    /// let b = DenseMatrix::from_rows(&[vec![3.0]]).unwrap();
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(a), Block::Leaf(b)]]).unwrap();
    /// let t = m.transpose();
    /// assert_eq!(t.nb_blocks(), (2, 1));
    /// assert_eq!(t.flatten().to_nested_vec(), vec![vec![1.0], vec![2.0], vec![3.0]]);
    /// ```
    pub fn transpose(&self) -> Self {
        let (nrows, ncols) = self.nb_blocks();
        let (job_of_position, jobs) = distinct_slots(self);

        let transposed: Vec<Slot<T>> = jobs
            .par_iter()
            .map(|&slot| {
                Arc::new(match slot.as_ref() {
                    Block::Leaf(leaf) => Block::Leaf(leaf.transpose()),
                    Block::Node(node) => Block::Node(node.transpose()),
                })
            })
            .collect();

        let mut slots = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                slots.push(Arc::clone(&transposed[job_of_position[i * ncols + j]]));
            }
        }
        let out = Self::from_parts(slots, self.block_shapes().transpose());
        debug!("transpose -> {}", out);
        out
    }
}

/// Discrete Fourier transform along a list of structurally identical matrices.
///
/// Output `k` holds, at every coordinate, the `k`-th Fourier coefficient of
/// the sequence of input values at that coordinate. The block structure and
/// sharing of the first input are kept.
///
/// # Errors
///
/// - `EmptyBatch` for an empty list.
/// - `BatchMismatch` when a matrix differs from the first in `nb_blocks` or
///   shape (only with `Validation::Check`).
/// - Tree- or leaf-level shape errors for differing partitions.
///
/// # Example
///
/// ```
/// use blockmatrix::{Block, BlockMatrix, DenseMatrix, Validation, fft_of_list};
///
/// let m = |x: f64| BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::filled(1, 1, x))]]).unwrap();
/// let out = fft_of_list(&[m(1.0), m(1.0)], Validation::Check).unwrap();
/// assert_eq!(out[0].flatten()[(0, 0)].re, 2.0);
/// assert_eq!(out[1].flatten()[(0, 0)].re, 0.0);
/// ```
pub fn fft_of_list<T: Scalar>(
    matrices: &[BlockMatrix<T>],
    validation: Validation,
) -> Result<Vec<BlockMatrix<c64>>> {
    batched_transform("fft_of_list", matrices, validation, false)
}

/// Inverse of [`fft_of_list`], normalized by `1 / N`.
pub fn ifft_of_list<T: Scalar>(
    matrices: &[BlockMatrix<T>],
    validation: Validation,
) -> Result<Vec<BlockMatrix<c64>>> {
    batched_transform("ifft_of_list", matrices, validation, true)
}

fn batched_transform<T: Scalar>(
    operation: &'static str,
    matrices: &[BlockMatrix<T>],
    validation: Validation,
    inverse: bool,
) -> Result<Vec<BlockMatrix<c64>>> {
    let first = matrices.first().ok_or(BlockMatrixError::EmptyBatch)?;
    if validation == Validation::Check {
        for (index, m) in matrices.iter().enumerate().skip(1) {
            if m.nb_blocks() != first.nb_blocks() || m.shape() != first.shape() {
                return Err(BlockMatrixError::BatchMismatch {
                    index,
                    expected_blocks: first.nb_blocks(),
                    found_blocks: m.nb_blocks(),
                    expected_shape: first.shape(),
                    found_shape: m.shape(),
                });
            }
        }
    }

    let trees: Vec<&BlockMatrix<T>> = matrices.iter().collect();
    let out = zip_map_trees(operation, &trees, matrices.len(), &|leaves: &[&DenseMatrix<T>]| {
        transform_leaves(leaves, inverse)
    })?;
    debug!("{} over {} matrices -> {}", operation, out.len(), out[0]);
    Ok(out)
}

/// Transform the stack of leaves along the stacking axis.
fn transform_leaves<T: Scalar>(
    leaves: &[&DenseMatrix<T>],
    inverse: bool,
) -> Result<Vec<DenseMatrix<c64>>> {
    let (nrows, ncols) = leaves[0].shape();
    if let Some(odd) = leaves.iter().find(|leaf| leaf.shape() != (nrows, ncols)) {
        return Err(BlockMatrixError::ShapeMismatch {
            expected: (nrows, ncols),
            actual: odd.shape(),
        });
    }

    let mut out: Vec<DenseMatrix<c64>> = (0..leaves.len())
        .map(|_| DenseMatrix::zeros(nrows, ncols))
        .collect();
    let mut buf = vec![c64::new(0.0, 0.0); leaves.len()];
    for e in 0..nrows * ncols {
        for (x, leaf) in buf.iter_mut().zip(leaves) {
            *x = leaf.data()[e].to_c64();
        }
        dft_in_place(&mut buf, inverse);
        for (leaf, &x) in out.iter_mut().zip(&buf) {
            leaf.data_mut()[e] = x;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn leaf(rows: &[Vec<f64>]) -> Block<f64> {
        Block::Leaf(DenseMatrix::from_rows(rows).unwrap())
    }

    fn sample(x: f64) -> BlockMatrix<f64> {
        BlockMatrix::new(vec![
            vec![leaf(&[vec![x, 2.0 * x]]), leaf(&[vec![-x]])],
            vec![leaf(&[vec![1.0, x]]), leaf(&[vec![x * x]])],
        ])
        .unwrap()
    }

    #[test]
    fn test_transpose_shapes() {
        let m = sample(1.0);
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.block_shapes().row_heights(), &[2, 1]);
        assert_eq!(t.block_shapes().col_widths(), &[1, 1]);
        assert_eq!(t.flatten(), m.flatten().transpose());
    }

    #[test]
    fn test_transpose_keeps_sharing() {
        let a: Slot<f64> = Arc::new(leaf(&[vec![1.0, 2.0], vec![3.0, 4.0]]));
        let z: Slot<f64> = Arc::new(Block::Leaf(DenseMatrix::zeros(2, 2)));
        let m = BlockMatrix::from_slots(vec![vec![a.clone(), z.clone()], vec![z, a]]).unwrap();
        let t = m.transpose();
        assert!(Arc::ptr_eq(t.slot(0, 0), t.slot(1, 1)));
        assert_eq!(t.flatten(), m.flatten().transpose());
    }

    #[test]
    fn test_transpose_nested() {
        let inner = BlockMatrix::new(vec![vec![leaf(&[vec![1.0]]), leaf(&[vec![2.0]])]]).unwrap();
        let m = BlockMatrix::new(vec![vec![Block::Node(inner), leaf(&[vec![3.0]])]]).unwrap();
        let t = m.transpose();
        assert_eq!(t.block(0, 0).as_node().unwrap().nb_blocks(), (2, 1));
        assert_eq!(t.flatten(), m.flatten().transpose());
    }

    #[test]
    fn test_fft_of_list_two_matrices() {
        let out = fft_of_list(&[sample(1.0), sample(3.0)], Validation::Check).unwrap();
        assert_eq!(out.len(), 2);
        let f0 = out[0].flatten();
        let f1 = out[1].flatten();
        // entry (0, 0): x = [1, 3]
        assert_abs_diff_eq!(f0[(0, 0)].re, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f1[(0, 0)].re, -2.0, epsilon = 1e-12);
        // entry (1, 0): x = [1, 1]
        assert_abs_diff_eq!(f0[(1, 0)].re, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f1[(1, 0)].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ifft_inverts_fft() {
        let input = [sample(1.0), sample(-2.0), sample(0.5)];
        let forward = fft_of_list(&input, Validation::Check).unwrap();
        let back = ifft_of_list(&forward, Validation::Check).unwrap();
        for (b, m) in back.iter().zip(&input) {
            let (b, m) = (b.flatten(), m.flatten());
            for (z, &x) in b.data().iter().zip(m.data()) {
                assert_abs_diff_eq!(z.re, x, epsilon = 1e-12);
                assert_abs_diff_eq!(z.im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_fft_of_list_empty() {
        let empty: [BlockMatrix<f64>; 0] = [];
        assert!(matches!(
            fft_of_list(&empty, Validation::Check),
            Err(BlockMatrixError::EmptyBatch)
        ));
    }

    #[test]
    fn test_fft_of_list_batch_mismatch() {
        let other = BlockMatrix::new(vec![vec![leaf(&[vec![1.0, 2.0, 3.0]])]]).unwrap();
        let result = fft_of_list(&[sample(1.0), other], Validation::Check);
        assert!(matches!(
            result,
            Err(BlockMatrixError::BatchMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_fft_of_list_preserves_sharing() {
        let make = |x: f64| {
            let a: Slot<f64> = Arc::new(leaf(&[vec![x]]));
            BlockMatrix::from_slots(vec![vec![a.clone(), a]]).unwrap()
        };
        let out = fft_of_list(&[make(1.0), make(2.0)], Validation::Check).unwrap();
        assert!(Arc::ptr_eq(out[1].slot(0, 0), out[1].slot(0, 1)));
    }
}
