//! The hierarchical block matrix type.
//!
//! ```text
//! BlockMatrix<T>
//! ├── BlockShapes        - row heights / column widths
//! └── grid of Slot<T>    - Arc<Block<T>>, row-major
//!     ├── Block::Leaf    - DenseMatrix<T>
//!     └── Block::Node    - nested BlockMatrix<T>
//! ```
//!
//! A slot is a shared reference: the same `Arc` may sit at several grid
//! positions. Sharing is read-only and is resolved by the position
//! enumerator when the matrix is materialized.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::partition::BlockShapes;
use crate::scalar::{Element, ElementType};

/// Content of one grid position.
#[derive(Debug, Clone)]
pub enum Block<T: Element> {
    /// Dense leaf.
    Leaf(DenseMatrix<T>),
    /// Nested block matrix.
    Node(BlockMatrix<T>),
}

/// Shared reference to block content.
pub type Slot<T> = Arc<Block<T>>;

impl<T: Element> Block<T> {
    /// Shape as `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Leaf(leaf) => leaf.shape(),
            Self::Node(node) => node.shape(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&DenseMatrix<T>> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&BlockMatrix<T>> {
        match self {
            Self::Leaf(_) => None,
            Self::Node(node) => Some(node),
        }
    }

    /// Dense copy of this block.
    pub fn to_dense(&self) -> DenseMatrix<T> {
        match self {
            Self::Leaf(leaf) => leaf.clone(),
            Self::Node(node) => node.flatten(),
        }
    }
}

impl<T: Element> From<DenseMatrix<T>> for Block<T> {
    fn from(leaf: DenseMatrix<T>) -> Self {
        Self::Leaf(leaf)
    }
}

impl<T: Element> From<BlockMatrix<T>> for Block<T> {
    fn from(node: BlockMatrix<T>) -> Self {
        Self::Node(node)
    }
}

/// Whether construction walks the grid to check block shapes.
///
/// `Skip` is for derived matrices whose partition is known by
/// construction (elementwise maps, products of compatible partitions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    #[default]
    Check,
    Skip,
}

/// A matrix stored as a rectangular grid of blocks.
#[derive(Debug, Clone)]
pub struct BlockMatrix<T: Element> {
    /// Row-major, `nb_blocks().0 * nb_blocks().1` entries.
    slots: Vec<Slot<T>>,
    shapes: BlockShapes,
}

impl<T: Element> BlockMatrix<T> {
    /// Build a block matrix from a grid of owned blocks, with validation.
    ///
    /// # Errors
    ///
    /// Returns a shape error if the grid is empty or ragged, if blocks in a
    /// block-row differ in height, or if blocks in a block-column differ in width.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// let b = DenseMatrix::<f64>::zeros(2, 3);
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(a), Block::Leaf(b)]]).unwrap();
    /// assert_eq!(m.shape(), (2, 5));
    /// assert_eq!(m.nb_blocks(), (1, 2));
    /// ```
    pub fn new(grid: Vec<Vec<Block<T>>>) -> Result<Self> {
        let grid = grid
            .into_iter()
            .map(|row| row.into_iter().map(Arc::new).collect())
            .collect();
        Self::from_slots(grid)
    }

    /// Build a block matrix from a grid of shared slots, with validation.
    ///
    /// Installing the same `Arc` at several positions shares its content.
    pub fn from_slots(grid: Vec<Vec<Slot<T>>>) -> Result<Self> {
        Self::from_slots_with(grid, None, Validation::Check)
    }

    /// Build a block matrix with optional precomputed block shapes.
    ///
    /// When `block_shapes` is `None`, row heights are read from the first
    /// block-column and column widths from the first block-row. With
    /// `Validation::Skip` the remaining blocks are not inspected; the caller
    /// guarantees consistency.
    pub fn from_slots_with(
        grid: Vec<Vec<Slot<T>>>,
        block_shapes: Option<BlockShapes>,
        validation: Validation,
    ) -> Result<Self> {
        let nrows = grid.len();
        let ncols = grid.first().map_or(0, Vec::len);
        if nrows == 0 || ncols == 0 {
            return Err(BlockMatrixError::EmptyGrid);
        }
        for (row, line) in grid.iter().enumerate() {
            if line.len() != ncols {
                return Err(BlockMatrixError::RaggedGrid {
                    row,
                    expected: ncols,
                    found: line.len(),
                });
            }
        }

        let shapes = match block_shapes {
            Some(shapes) => {
                if shapes.nb_blocks() != (nrows, ncols) {
                    return Err(BlockMatrixError::BlockShapeMismatch {
                        left: shapes.as_vecs(),
                        right: derive_block_shapes(&grid).as_vecs(),
                    });
                }
                shapes
            }
            None => derive_block_shapes(&grid),
        };

        let slots: Vec<Slot<T>> = grid.into_iter().flatten().collect();
        let matrix = Self::from_parts(slots, shapes);
        if validation == Validation::Check {
            matrix.check_dimensions_of_blocks()?;
        }
        debug!("New block matrix: {}", matrix);
        Ok(matrix)
    }

    /// Assemble from row-major slots whose consistency is known by construction.
    pub(crate) fn from_parts(slots: Vec<Slot<T>>, shapes: BlockShapes) -> Self {
        let (nrows, ncols) = shapes.nb_blocks();
        debug_assert_eq!(slots.len(), nrows * ncols);
        Self { slots, shapes }
    }

    fn check_dimensions_of_blocks(&self) -> Result<()> {
        let (nrows, ncols) = self.nb_blocks();
        for i in 0..nrows {
            let expected = self.shapes.rows().block_size(i);
            for j in 0..ncols {
                let found = self.block(i, j).shape().0;
                if found != expected {
                    return Err(BlockMatrixError::InconsistentHeight {
                        row: i,
                        col: j,
                        expected,
                        found,
                    });
                }
            }
        }
        for j in 0..ncols {
            let expected = self.shapes.cols().block_size(j);
            for i in 0..nrows {
                let found = self.block(i, j).shape().1;
                if found != expected {
                    return Err(BlockMatrixError::InconsistentWidth {
                        row: i,
                        col: j,
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(())
    }

    /// Total shape `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.shapes.shape()
    }

    /// Number of block-rows and block-columns.
    #[inline]
    pub fn nb_blocks(&self) -> (usize, usize) {
        self.shapes.nb_blocks()
    }

    /// Row heights and column widths.
    #[inline]
    pub fn block_shapes(&self) -> &BlockShapes {
        &self.shapes
    }

    /// Element type shared by every leaf of the tree.
    #[inline]
    pub fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    /// Shared slot at block position `(i, j)`.
    ///
    /// # Panics
    /// Panics if the position is outside the grid.
    #[inline]
    pub fn slot(&self, i: usize, j: usize) -> &Slot<T> {
        let (nrows, ncols) = self.nb_blocks();
        assert!(
            i < nrows && j < ncols,
            "block ({}, {}) out of bounds for grid {}x{}",
            i,
            j,
            nrows,
            ncols
        );
        &self.slots[i * ncols + j]
    }

    /// Block content at block position `(i, j)`.
    #[inline]
    pub fn block(&self, i: usize, j: usize) -> &Block<T> {
        self.slot(i, j)
    }

    /// Slots in row-major order.
    #[inline]
    pub fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }

    /// Iterate over block-rows.
    pub fn block_rows(&self) -> impl Iterator<Item = &[Slot<T>]> {
        self.slots.chunks(self.nb_blocks().1)
    }

    /// Maximum nesting depth; a grid of leaves has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .slots
            .iter()
            .map(|slot| match slot.as_ref() {
                Block::Leaf(_) => 0,
                Block::Node(node) => node.depth(),
            })
            .max()
            .unwrap_or(0)
    }

    /// Identity comparison: both matrices reference exactly the same stored
    /// slots at every position.
    ///
    /// This is unrelated to [`BlockMatrix::eq_elementwise`], which compares values.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.shapes == other.shapes
            && self
                .slots
                .iter()
                .zip(other.slots.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

fn derive_block_shapes<T: Element>(grid: &[Vec<Slot<T>>]) -> BlockShapes {
    let row_heights: Vec<usize> = grid.iter().map(|line| line[0].shape().0).collect();
    let col_widths: Vec<usize> = grid[0].iter().map(|slot| slot.shape().1).collect();
    BlockShapes::new(row_heights, col_widths)
}

impl<T: Element> fmt::Display for BlockMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockMatrix(nb_blocks={:?}, shape={:?}",
            self.nb_blocks(),
            self.shape()
        )?;
        if T::ELEMENT_TYPE != ElementType::Float64 {
            write!(f, ", dtype={}", T::ELEMENT_TYPE)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;

    fn leaf(nrows: usize, ncols: usize, value: f64) -> Block<f64> {
        Block::Leaf(DenseMatrix::filled(nrows, ncols, value))
    }

    #[test]
    fn test_shape_and_block_shapes() {
        let m = BlockMatrix::new(vec![
            vec![leaf(3, 4, 1.0), leaf(3, 2, 2.0)],
            vec![leaf(1, 4, 3.0), leaf(1, 2, 4.0)],
        ])
        .unwrap();
        assert_eq!(m.shape(), (4, 6));
        assert_eq!(m.nb_blocks(), (2, 2));
        assert_eq!(m.block_shapes().row_heights(), &[3, 1]);
        assert_eq!(m.block_shapes().col_widths(), &[4, 2]);
        assert_eq!(m.element_type(), ElementType::Float64);
        assert_eq!(m.depth(), 1);
    }

    #[test]
    fn test_empty_grid() {
        let result = BlockMatrix::<f64>::new(vec![]);
        assert!(matches!(result, Err(BlockMatrixError::EmptyGrid)));
        let result = BlockMatrix::<f64>::new(vec![vec![]]);
        assert!(matches!(result, Err(BlockMatrixError::EmptyGrid)));
    }

    #[test]
    fn test_ragged_grid() {
        let result = BlockMatrix::new(vec![
            vec![leaf(2, 2, 1.0), leaf(2, 2, 1.0)],
            vec![leaf(2, 2, 1.0)],
        ]);
        assert!(matches!(
            result,
            Err(BlockMatrixError::RaggedGrid {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_inconsistent_height() {
        let result = BlockMatrix::new(vec![vec![leaf(2, 2, 1.0), leaf(3, 2, 1.0)]]);
        let err = result.unwrap_err();
        assert!(err.is_shape_error());
        assert!(matches!(
            err,
            BlockMatrixError::InconsistentHeight {
                row: 0,
                col: 1,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_inconsistent_width() {
        let result = BlockMatrix::new(vec![vec![leaf(2, 2, 1.0)], vec![leaf(2, 5, 1.0)]]);
        assert!(matches!(
            result,
            Err(BlockMatrixError::InconsistentWidth { row: 1, col: 0, .. })
        ));
    }

    #[test]
    fn test_skip_validation_accepts_inconsistent_grid() {
        let grid = vec![vec![Arc::new(leaf(2, 2, 1.0)), Arc::new(leaf(3, 2, 1.0))]];
        let m = BlockMatrix::from_slots_with(grid, None, Validation::Skip).unwrap();
        assert_eq!(m.shape(), (2, 4));
    }

    #[test]
    fn test_precomputed_shapes_must_match_grid() {
        let grid = vec![vec![Arc::new(leaf(2, 2, 1.0))]];
        let shapes = BlockShapes::new([2, 2], [2]);
        let result = BlockMatrix::from_slots_with(grid, Some(shapes), Validation::Skip);
        assert!(matches!(
            result,
            Err(BlockMatrixError::BlockShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_nested() {
        let inner = BlockMatrix::new(vec![vec![leaf(1, 1, 1.0), leaf(1, 2, 2.0)]]).unwrap();
        let outer = BlockMatrix::new(vec![
            vec![Block::Node(inner.clone()), leaf(1, 1, 3.0)],
            vec![leaf(2, 3, 4.0), leaf(2, 1, 5.0)],
        ])
        .unwrap();
        assert_eq!(outer.shape(), (3, 4));
        assert_eq!(outer.depth(), 2);
        assert!(outer.block(0, 0).as_node().is_some());
        assert!(outer.block(1, 1).is_leaf());
    }

    #[test]
    fn test_shares_storage_with() {
        let m = BlockMatrix::new(vec![vec![leaf(2, 2, 1.0)]]).unwrap();
        let alias = m.clone();
        let copy = BlockMatrix::new(vec![vec![leaf(2, 2, 1.0)]]).unwrap();
        assert!(m.shares_storage_with(&alias));
        assert!(!m.shares_storage_with(&copy));
    }

    #[test]
    fn test_display() {
        let m = BlockMatrix::new(vec![vec![leaf(2, 2, 1.0), leaf(2, 1, 1.0)]]).unwrap();
        assert_eq!(m.to_string(), "BlockMatrix(nb_blocks=(1, 2), shape=(2, 3))");

        let z = BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::filled(
            1,
            1,
            c64::new(0.0, 1.0),
        ))]])
        .unwrap();
        assert_eq!(
            z.to_string(),
            "BlockMatrix(nb_blocks=(1, 1), shape=(1, 1), dtype=complex128)"
        );
    }
}
