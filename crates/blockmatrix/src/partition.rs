//! Partitions of the rows and columns of a block matrix.

use std::fmt;

/// Block sizes along one axis, with precomputed cumulative offsets.
///
/// # Example
/// ```
/// use blockmatrix::BlockDim;
///
/// let dim = BlockDim::new(vec![2, 3, 4]);
/// assert_eq!(dim.nblocks(), 3);
/// assert_eq!(dim.total_size(), 9);
/// assert_eq!(dim.block_offset(2), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDim {
    block_sizes: Vec<usize>,
    /// cumulative[i] = sum of block_sizes[0..i]
    cumulative: Vec<usize>,
}

impl BlockDim {
    pub fn new(block_sizes: Vec<usize>) -> Self {
        let mut cumulative = Vec::with_capacity(block_sizes.len() + 1);
        cumulative.push(0);
        let mut total = 0usize;
        for &size in &block_sizes {
            total += size;
            cumulative.push(total);
        }
        Self {
            block_sizes,
            cumulative,
        }
    }

    #[inline]
    pub fn nblocks(&self) -> usize {
        self.block_sizes.len()
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        self.cumulative[self.block_sizes.len()]
    }

    /// # Panics
    /// Panics if `block_index` is out of bounds.
    #[inline]
    pub fn block_size(&self, block_index: usize) -> usize {
        self.block_sizes[block_index]
    }

    /// Index where a block starts along this axis.
    ///
    /// `block_offset(nblocks())` is the total size.
    #[inline]
    pub fn block_offset(&self, block_index: usize) -> usize {
        self.cumulative[block_index]
    }

    #[inline]
    pub fn block_sizes(&self) -> &[usize] {
        &self.block_sizes
    }

    /// Range covered by a block along this axis.
    #[inline]
    pub fn block_range(&self, block_index: usize) -> std::ops::Range<usize> {
        self.cumulative[block_index]..self.cumulative[block_index + 1]
    }

}

impl fmt::Display for BlockDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockDim({:?})", self.block_sizes)
    }
}

impl From<Vec<usize>> for BlockDim {
    fn from(block_sizes: Vec<usize>) -> Self {
        Self::new(block_sizes)
    }
}

impl<const N: usize> From<[usize; N]> for BlockDim {
    fn from(block_sizes: [usize; N]) -> Self {
        Self::new(block_sizes.to_vec())
    }
}

/// Row heights and column widths of a block grid.
///
/// ```text
/// AAAABB
/// AAAABB  ->  rows = [3], cols = [4, 2]
/// AAAABB
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockShapes {
    rows: BlockDim,
    cols: BlockDim,
}

impl BlockShapes {
    pub fn new(row_heights: impl Into<BlockDim>, col_widths: impl Into<BlockDim>) -> Self {
        Self {
            rows: row_heights.into(),
            cols: col_widths.into(),
        }
    }

    #[inline]
    pub fn rows(&self) -> &BlockDim {
        &self.rows
    }

    #[inline]
    pub fn cols(&self) -> &BlockDim {
        &self.cols
    }

    #[inline]
    pub fn row_heights(&self) -> &[usize] {
        self.rows.block_sizes()
    }

    #[inline]
    pub fn col_widths(&self) -> &[usize] {
        self.cols.block_sizes()
    }

    /// Number of block-rows and block-columns.
    #[inline]
    pub fn nb_blocks(&self) -> (usize, usize) {
        (self.rows.nblocks(), self.cols.nblocks())
    }

    /// Total shape: sum of row heights, sum of column widths.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.total_size(), self.cols.total_size())
    }

    /// Top-left corner of block `(i, j)` relative to the matrix origin.
    #[inline]
    pub fn block_origin(&self, i: usize, j: usize) -> (usize, usize) {
        (self.rows.block_offset(i), self.cols.block_offset(j))
    }

    /// Shape of block `(i, j)`.
    #[inline]
    pub fn block_shape(&self, i: usize, j: usize) -> (usize, usize) {
        (self.rows.block_size(i), self.cols.block_size(j))
    }

    /// Partition of the transposed grid.
    pub fn transpose(&self) -> Self {
        Self {
            rows: self.cols.clone(),
            cols: self.rows.clone(),
        }
    }

    pub(crate) fn as_vecs(&self) -> (Vec<usize>, Vec<usize>) {
        (self.row_heights().to_vec(), self.col_widths().to_vec())
    }
}

impl fmt::Display for BlockShapes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.row_heights(), self.col_widths())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_dim_offsets() {
        let dim = BlockDim::new(vec![2, 3, 4]);
        assert_eq!(dim.block_offset(0), 0);
        assert_eq!(dim.block_offset(1), 2);
        assert_eq!(dim.block_offset(2), 5);
        assert_eq!(dim.block_offset(3), 9);
        assert_eq!(dim.block_range(1), 2..5);
    }

    #[test]
    fn test_block_shapes() {
        let shapes = BlockShapes::new([3], [4, 2]);
        assert_eq!(shapes.nb_blocks(), (1, 2));
        assert_eq!(shapes.shape(), (3, 6));
        assert_eq!(shapes.block_origin(0, 1), (0, 4));
        assert_eq!(shapes.block_shape(0, 1), (3, 2));
    }

    #[test]
    fn test_block_shapes_transpose() {
        let shapes = BlockShapes::new([3, 1], [4, 2, 5]);
        let t = shapes.transpose();
        assert_eq!(t.row_heights(), &[4, 2, 5]);
        assert_eq!(t.col_widths(), &[3, 1]);
        assert_eq!(t.shape(), (11, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(BlockDim::new(vec![1, 2]).to_string(), "BlockDim([1, 2])");
        assert_eq!(BlockShapes::new([3], [4, 2]).to_string(), "([3], [4, 2])");
    }
}
