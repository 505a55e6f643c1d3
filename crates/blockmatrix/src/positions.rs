//! Position enumeration and assembly into a dense matrix.
//!
//! Every stored slot is reported once, in row-major order of its first
//! appearance, together with all absolute anchors where its content
//! belongs. A slot referenced from several grid positions therefore has
//! several anchors; assembly computes it once and copies it to the others.

use std::collections::HashMap;
use std::sync::Arc;

use crate::block_matrix::{Block, BlockMatrix, Slot};
use crate::dense::DenseMatrix;
use crate::scalar::Element;

/// A stored slot and the absolute positions of its top-left corner.
#[derive(Debug, Clone)]
pub struct StoredBlock<'a, T: Element> {
    pub slot: &'a Slot<T>,
    /// Non-empty; the first anchor is the first appearance in row-major order.
    pub anchors: Vec<(usize, usize)>,
}

/// A rectangle of the block structure, for diagnostic plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
    /// Index into the caller's palette.
    pub color: usize,
    /// Set on the copies drawn at the second and later anchors of a shared slot.
    pub replica: bool,
}

impl<T: Element> BlockMatrix<T> {
    /// Enumerate stored slots with their anchors, relative to `origin`.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let a = Block::Leaf(DenseMatrix::<f64>::zeros(2, 4));
    /// let b = Block::Leaf(DenseMatrix::<f64>::zeros(2, 2));
    /// let c = Block::Leaf(DenseMatrix::<f64>::zeros(1, 4));
    /// let d = Block::Leaf(DenseMatrix::<f64>::zeros(1, 2));
    /// let m = BlockMatrix::new(vec![vec![a, b], vec![c, d]]).unwrap();
    ///
    /// let anchors: Vec<_> = m
    ///     .stored_block_positions((0, 0))
    ///     .into_iter()
    ///     .map(|stored| stored.anchors)
    ///     .collect();
    /// assert_eq!(anchors, vec![vec![(0, 0)], vec![(0, 4)], vec![(2, 0)], vec![(2, 4)]]);
    /// ```
    pub fn stored_block_positions(&self, origin: (usize, usize)) -> Vec<StoredBlock<'_, T>> {
        let (nrows, ncols) = self.nb_blocks();
        let shapes = self.block_shapes();
        let mut stored: Vec<StoredBlock<'_, T>> = Vec::with_capacity(nrows * ncols);
        let mut index_of: HashMap<*const Block<T>, usize> = HashMap::new();

        for i in 0..nrows {
            for j in 0..ncols {
                let slot = self.slot(i, j);
                let (x, y) = shapes.block_origin(i, j);
                let anchor = (origin.0 + x, origin.1 + y);
                match index_of.get(&Arc::as_ptr(slot)) {
                    Some(&k) => stored[k].anchors.push(anchor),
                    None => {
                        index_of.insert(Arc::as_ptr(slot), stored.len());
                        stored.push(StoredBlock {
                            slot,
                            anchors: vec![anchor],
                        });
                    }
                }
            }
        }
        stored
    }

    /// Number of distinct stored slots at the top level.
    pub fn nb_stored_blocks(&self) -> usize {
        self.stored_block_positions((0, 0)).len()
    }

    /// Flatten the block structure into a dense matrix.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let a = DenseMatrix::from_rows(&[vec![1.0]]).unwrap();
    /// let b = DenseMatrix::from_rows(&[vec![2.0]]).unwrap();
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(a), Block::Leaf(b)]]).unwrap();
    /// assert_eq!(m.flatten().to_nested_vec(), vec![vec![1.0, 2.0]]);
    /// ```
    pub fn flatten(&self) -> DenseMatrix<T> {
        let (nrows, ncols) = self.shape();
        let mut full = DenseMatrix::filled(nrows, ncols, T::default());
        self.put_in_full_matrix(&mut full, (0, 0));
        full
    }

    fn put_in_full_matrix(&self, full: &mut DenseMatrix<T>, origin: (usize, usize)) {
        for stored in self.stored_block_positions(origin) {
            match stored.slot.as_ref() {
                Block::Node(node) => {
                    let first = stored.anchors[0];
                    node.put_in_full_matrix(full, first);
                    // Later appearances copy the first one instead of recursing again.
                    for &anchor in &stored.anchors[1..] {
                        full.copy_region(first, anchor, node.shape());
                    }
                }
                Block::Leaf(leaf) => {
                    for &(row, col) in &stored.anchors {
                        full.copy_from(leaf, row, col);
                    }
                }
            }
        }
    }

    /// Rectangles describing the block structure.
    ///
    /// Leaves get consecutive colors modulo `palette_size`; the copies of a
    /// shared slot reuse the colors of its first appearance.
    pub fn patches(&self, palette_size: usize) -> Vec<Patch> {
        let mut next_color = 0;
        let mut patches = Vec::new();
        self.collect_patches((0, 0), palette_size.max(1), &mut next_color, &mut patches);
        patches
    }

    fn collect_patches(
        &self,
        origin: (usize, usize),
        palette_size: usize,
        next_color: &mut usize,
        out: &mut Vec<Patch>,
    ) {
        for stored in self.stored_block_positions(origin) {
            let first = stored.anchors[0];
            let mut own = Vec::new();
            match stored.slot.as_ref() {
                Block::Node(node) => node.collect_patches(first, palette_size, next_color, &mut own),
                Block::Leaf(leaf) => {
                    own.push(Patch {
                        row: first.0,
                        col: first.1,
                        height: leaf.nrows(),
                        width: leaf.ncols(),
                        color: *next_color % palette_size,
                        replica: false,
                    });
                    *next_color += 1;
                }
            }
            let mut replicas = Vec::new();
            for &anchor in &stored.anchors[1..] {
                for patch in &own {
                    replicas.push(Patch {
                        row: patch.row - first.0 + anchor.0,
                        col: patch.col - first.1 + anchor.1,
                        replica: true,
                        ..*patch
                    });
                }
            }
            out.extend(own);
            out.extend(replicas);
        }
    }
}
