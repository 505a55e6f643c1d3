//! Companion constructors built on the shared-slot grid.

use std::sync::Arc;

use crate::block_matrix::{Block, BlockMatrix, Slot};
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::partition::BlockShapes;
use crate::scalar::{Element, Scalar};

/// Cut a dense matrix into a block matrix with the given partition.
///
/// # Errors
///
/// - `EmptyGrid` if either partition is empty.
/// - `DimensionMismatch` if a partition does not sum to the matching dimension.
///
/// # Example
///
/// ```
/// use blockmatrix::{DenseMatrix, cut_dense};
///
/// let d = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
/// let m = cut_dense(&d, &[1, 1], &[2, 1]).unwrap();
/// assert_eq!(m.nb_blocks(), (2, 2));
/// assert_eq!(m.flatten(), d);
/// ```
pub fn cut_dense<T: Element>(
    dense: &DenseMatrix<T>,
    row_heights: &[usize],
    col_widths: &[usize],
) -> Result<BlockMatrix<T>> {
    if row_heights.is_empty() || col_widths.is_empty() {
        return Err(BlockMatrixError::EmptyGrid);
    }
    let shapes = BlockShapes::new(row_heights.to_vec(), col_widths.to_vec());
    let (nrows, ncols) = shapes.shape();
    if nrows != dense.nrows() {
        return Err(BlockMatrixError::DimensionMismatch {
            expected: dense.nrows(),
            actual: nrows,
        });
    }
    if ncols != dense.ncols() {
        return Err(BlockMatrixError::DimensionMismatch {
            expected: dense.ncols(),
            actual: ncols,
        });
    }

    let mut slots = Vec::with_capacity(row_heights.len() * col_widths.len());
    for i in 0..row_heights.len() {
        for j in 0..col_widths.len() {
            let (row, col) = shapes.block_origin(i, j);
            let (h, w) = shapes.block_shape(i, j);
            slots.push(Arc::new(Block::Leaf(dense.submatrix(row, col, h, w))));
        }
    }
    Ok(BlockMatrix::from_parts(slots, shapes))
}

/// Zero-filled matrix with the structure of `like`.
///
/// Nested nodes are reproduced as nodes; sharing is reproduced too, so a
/// slot referenced twice in `like` is a single zero slot in the result.
pub fn zeros_like<T: Scalar>(like: &BlockMatrix<T>) -> BlockMatrix<T> {
    like.map(|_| T::zero())
}

/// Identity matrix with the same partition on both axes.
pub fn identity_like<T: Scalar>(block_sizes: &[usize]) -> Result<BlockMatrix<T>> {
    let n = block_sizes.len();
    let grid = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let leaf = if i == j {
                        DenseMatrix::identity(block_sizes[i])
                    } else {
                        DenseMatrix::zeros(block_sizes[i], block_sizes[j])
                    };
                    Arc::new(Block::Leaf(leaf))
                })
                .collect()
        })
        .collect();
    BlockMatrix::from_slots(grid)
}

/// Symmetric block Toeplitz matrix: block `(i, j)` is `first_row[|i - j|]`.
///
/// Each distinct block is stored once and shared along its diagonal.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use blockmatrix::{Block, DenseMatrix, block_toeplitz};
///
/// let a = Arc::new(Block::Leaf(DenseMatrix::filled(1, 1, 1.0)));
/// let b = Arc::new(Block::Leaf(DenseMatrix::filled(1, 1, 2.0)));
/// let m = block_toeplitz(&[a, b]).unwrap();
/// assert_eq!(m.nb_stored_blocks(), 2);
/// assert_eq!(m.flatten().to_nested_vec(), vec![vec![1.0, 2.0], vec![2.0, 1.0]]);
/// ```
pub fn block_toeplitz<T: Element>(first_row: &[Slot<T>]) -> Result<BlockMatrix<T>> {
    let n = first_row.len();
    let grid = (0..n)
        .map(|i| (0..n).map(|j| Arc::clone(&first_row[i.abs_diff(j)])).collect())
        .collect();
    BlockMatrix::from_slots(grid)
}

/// Block circulant matrix: block `(i, j)` is `first_row[(j - i) mod n]`.
pub fn block_circulant<T: Element>(first_row: &[Slot<T>]) -> Result<BlockMatrix<T>> {
    let n = first_row.len();
    let grid = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| Arc::clone(&first_row[(j + n - i) % n]))
                .collect()
        })
        .collect();
    BlockMatrix::from_slots(grid)
}
