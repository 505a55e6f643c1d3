//! Elementwise algebra on block matrices.
//!
//! Every elementwise operation goes through [`zip_map_trees`]: the trees are
//! walked in lockstep, each distinct tuple of stored slots is computed once
//! (in parallel), and the results are installed at every grid position that
//! referenced that tuple. Sharing in the inputs is therefore preserved in
//! the outputs.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::block_matrix::{Block, BlockMatrix, Slot};
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::scalar::{Element, Scalar, c64};

/// Walk `trees` in lockstep and apply `leaf_op` to every tuple of leaves.
///
/// `leaf_op` receives one leaf per input tree and returns `n_out` leaves;
/// output tree `k` is built from the `k`-th leaf of every call. The output
/// trees reuse the partition of the first input.
///
/// # Errors
///
/// - `Unsupported` if the trees disagree in `nb_blocks`.
/// - `BlockShapeMismatch` if they agree in `nb_blocks` but not in partition.
/// - `SlotKindMismatch` if a leaf is paired with a node.
/// - Whatever `leaf_op` returns.
pub(crate) fn zip_map_trees<T, U, F>(
    operation: &'static str,
    trees: &[&BlockMatrix<T>],
    n_out: usize,
    leaf_op: &F,
) -> Result<Vec<BlockMatrix<U>>>
where
    T: Element,
    U: Element,
    F: Fn(&[&DenseMatrix<T>]) -> Result<Vec<DenseMatrix<U>>> + Sync,
{
    let first = trees[0];
    for other in &trees[1..] {
        if other.nb_blocks() != first.nb_blocks() {
            return Err(BlockMatrixError::Unsupported {
                operation,
                reason: format!(
                    "nb_blocks {:?} vs {:?}",
                    first.nb_blocks(),
                    other.nb_blocks()
                ),
            });
        }
        if other.block_shapes() != first.block_shapes() {
            return Err(BlockMatrixError::BlockShapeMismatch {
                left: first.block_shapes().as_vecs(),
                right: other.block_shapes().as_vecs(),
            });
        }
    }

    // One job per distinct tuple of stored slots.
    let npos = first.slots().len();
    let mut job_of_tuple: HashMap<Vec<*const Block<T>>, usize> = HashMap::new();
    let mut job_of_position = Vec::with_capacity(npos);
    let mut jobs: Vec<usize> = Vec::new();
    for pos in 0..npos {
        let key: Vec<_> = trees.iter().map(|t| Arc::as_ptr(&t.slots()[pos])).collect();
        let job = *job_of_tuple.entry(key).or_insert_with(|| {
            jobs.push(pos);
            jobs.len() - 1
        });
        job_of_position.push(job);
    }

    let ncols = first.nb_blocks().1;
    let results: Vec<Vec<Slot<U>>> = jobs
        .par_iter()
        .map(|&pos| {
            let blocks: Vec<&Block<T>> = trees.iter().map(|t| t.slots()[pos].as_ref()).collect();
            zip_map_blocks(operation, &blocks, (pos / ncols, pos % ncols), n_out, leaf_op)
        })
        .collect::<Result<_>>()?;

    Ok((0..n_out)
        .map(|k| {
            let slots = job_of_position
                .iter()
                .map(|&job| Arc::clone(&results[job][k]))
                .collect();
            BlockMatrix::from_parts(slots, first.block_shapes().clone())
        })
        .collect())
}

fn zip_map_blocks<T, U, F>(
    operation: &'static str,
    blocks: &[&Block<T>],
    (row, col): (usize, usize),
    n_out: usize,
    leaf_op: &F,
) -> Result<Vec<Slot<U>>>
where
    T: Element,
    U: Element,
    F: Fn(&[&DenseMatrix<T>]) -> Result<Vec<DenseMatrix<U>>> + Sync,
{
    if let Some(leaves) = blocks.iter().map(|b| b.as_leaf()).collect::<Option<Vec<_>>>() {
        let out = leaf_op(&leaves)?;
        debug_assert_eq!(out.len(), n_out);
        return Ok(out.into_iter().map(|leaf| Arc::new(Block::Leaf(leaf))).collect());
    }
    if let Some(nodes) = blocks.iter().map(|b| b.as_node()).collect::<Option<Vec<_>>>() {
        let out = zip_map_trees(operation, &nodes, n_out, leaf_op)?;
        return Ok(out.into_iter().map(|node| Arc::new(Block::Node(node))).collect());
    }
    Err(BlockMatrixError::SlotKindMismatch { row, col })
}

/// Distinct stored slots in first-appearance order, and the index into
/// that list for every grid position.
pub(crate) fn distinct_slots<T: Element>(tree: &BlockMatrix<T>) -> (Vec<usize>, Vec<&Slot<T>>) {
    let mut job_of_slot: HashMap<*const Block<T>, usize> = HashMap::new();
    let mut jobs: Vec<&Slot<T>> = Vec::new();
    let job_of_position = tree
        .slots()
        .iter()
        .map(|slot| {
            *job_of_slot.entry(Arc::as_ptr(slot)).or_insert_with(|| {
                jobs.push(slot);
                jobs.len() - 1
            })
        })
        .collect();
    (job_of_position, jobs)
}

/// Single-operand traversal: `leaf_op` runs once per distinct stored leaf.
fn map_tree<T, U, F>(tree: &BlockMatrix<T>, leaf_op: &F) -> BlockMatrix<U>
where
    T: Element,
    U: Element,
    F: Fn(&DenseMatrix<T>) -> DenseMatrix<U> + Sync,
{
    let (job_of_position, jobs) = distinct_slots(tree);
    let mapped: Vec<Slot<U>> = jobs
        .par_iter()
        .map(|&slot| {
            Arc::new(match slot.as_ref() {
                Block::Leaf(leaf) => Block::Leaf(leaf_op(leaf)),
                Block::Node(node) => Block::Node(map_tree(node, leaf_op)),
            })
        })
        .collect();
    let slots = job_of_position
        .iter()
        .map(|&job| Arc::clone(&mapped[job]))
        .collect();
    BlockMatrix::from_parts(slots, tree.block_shapes().clone())
}

/// Visit every distinct stored leaf once, stopping when `visit` returns `false`.
///
/// Returns `false` if the walk was stopped early.
fn for_each_stored_leaf<T: Element>(
    matrix: &BlockMatrix<T>,
    visit: &mut impl FnMut(&DenseMatrix<T>) -> bool,
) -> bool {
    for stored in matrix.stored_block_positions((0, 0)) {
        let keep_going = match stored.slot.as_ref() {
            Block::Leaf(leaf) => visit(leaf),
            Block::Node(node) => for_each_stored_leaf(node, visit),
        };
        if !keep_going {
            return false;
        }
    }
    true
}

impl<T: Element> BlockMatrix<T> {
    /// Apply `f` to every element, keeping the partition.
    ///
    /// The element type may change, which makes this the cast primitive.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::filled(2, 2, 3.0))]]).unwrap();
    /// let positive = m.map(|x: f64| x > 0.0);
    /// assert!(positive.all());
    /// ```
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U + Sync) -> BlockMatrix<U> {
        let out = map_tree(self, &|leaf: &DenseMatrix<T>| leaf.map(&f));
        debug!("map -> {}", out);
        out
    }

    /// Combine two trees element by element.
    ///
    /// # Errors
    ///
    /// `Unsupported` when the block grids differ; shape errors when the
    /// partitions or leaf shapes differ.
    pub fn try_zip_with<V: Element>(
        &self,
        other: &Self,
        operation: &'static str,
        f: impl Fn(T, T) -> V + Sync,
    ) -> Result<BlockMatrix<V>> {
        let mut out = zip_map_trees(operation, &[self, other], 1, &|leaves: &[&DenseMatrix<T>]| {
            Ok(vec![leaves[0].zip_map(leaves[1], &f)?])
        })?;
        debug!("{} -> {}", operation, out[0]);
        Ok(out.swap_remove(0))
    }

    /// Elementwise equality, as a boolean tree of the same partition.
    ///
    /// This compares values. Use [`BlockMatrix::shares_storage_with`] for
    /// identity.
    pub fn eq_elementwise(&self, other: &Self) -> Result<BlockMatrix<bool>> {
        self.try_zip_with(other, "eq", |a, b| a == b)
    }

    /// Elementwise inequality.
    pub fn ne_elementwise(&self, other: &Self) -> Result<BlockMatrix<bool>> {
        Ok(self.eq_elementwise(other)?.not())
    }

    /// Whether every element is nonzero. Stops at the first zero.
    pub fn all(&self) -> bool {
        for_each_stored_leaf(self, &mut |leaf| leaf.data().iter().all(|&x| x.is_nonzero()))
    }

    /// Whether any element is nonzero. Stops at the first nonzero.
    pub fn any(&self) -> bool {
        !for_each_stored_leaf(self, &mut |leaf| !leaf.data().iter().any(|&x| x.is_nonzero()))
    }
}

impl BlockMatrix<bool> {
    /// Logical negation of every element.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        self.map(|x| !x)
    }
}

impl BlockMatrix<f64> {
    /// Smallest element, `None` if every leaf is empty. NaN propagates.
    pub fn min(&self) -> Option<f64> {
        self.reduce(f64::min)
    }

    /// Largest element, `None` if every leaf is empty. NaN propagates.
    pub fn max(&self) -> Option<f64> {
        self.reduce(f64::max)
    }

    fn reduce(&self, pick: impl Fn(f64, f64) -> f64) -> Option<f64> {
        let mut acc: Option<f64> = None;
        for_each_stored_leaf(self, &mut |leaf| {
            for &x in leaf.data() {
                acc = Some(match acc {
                    Some(a) if a.is_nan() || x.is_nan() => f64::NAN,
                    Some(a) => pick(a, x),
                    None => x,
                });
            }
            true
        });
        acc
    }
}

impl<T: Scalar> BlockMatrix<T> {
    /// Widen every element to `c64`.
    pub fn to_complex(&self) -> BlockMatrix<c64> {
        self.map(Scalar::to_c64)
    }

    /// Multiply every element by `c`.
    pub fn scale(&self, c: T) -> Self {
        self.map(|x| x * c)
    }

    /// Divide every element by `c`. Division by zero follows IEEE rules.
    pub fn div_scalar(&self, c: T) -> Self {
        self.map(|x| x / c)
    }

    /// `c / x` for every element.
    pub fn rdiv_scalar(&self, c: T) -> Self {
        self.map(|x| c / x)
    }

    /// Elementwise sum.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix};
    ///
    /// let a = BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::filled(1, 2, 1.0))]]).unwrap();
    /// let b = BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::filled(1, 2, 2.0))]]).unwrap();
    /// let c = a.try_add(&b).unwrap();
    /// assert_eq!(c.flatten().to_nested_vec(), vec![vec![3.0, 3.0]]);
    /// ```
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn mul_elementwise(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "mul", |a, b| a * b)
    }

    /// Elementwise quotient.
    pub fn div_elementwise(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "div", |a, b| a / b)
    }
}

impl<T: Scalar> std::ops::Neg for &BlockMatrix<T> {
    type Output = BlockMatrix<T>;

    fn neg(self) -> BlockMatrix<T> {
        self.map(|x| -x)
    }
}

impl<T: Scalar> std::ops::Add for &BlockMatrix<T> {
    type Output = Result<BlockMatrix<T>>;

    fn add(self, rhs: &BlockMatrix<T>) -> Result<BlockMatrix<T>> {
        self.try_add(rhs)
    }
}

impl<T: Scalar> std::ops::Sub for &BlockMatrix<T> {
    type Output = Result<BlockMatrix<T>>;

    fn sub(self, rhs: &BlockMatrix<T>) -> Result<BlockMatrix<T>> {
        self.try_sub(rhs)
    }
}

impl<T: Scalar> std::ops::Mul<T> for &BlockMatrix<T> {
    type Output = BlockMatrix<T>;

    fn mul(self, rhs: T) -> BlockMatrix<T> {
        self.scale(rhs)
    }
}

impl<T: Scalar> std::ops::Div<T> for &BlockMatrix<T> {
    type Output = BlockMatrix<T>;

    fn div(self, rhs: T) -> BlockMatrix<T> {
        self.div_scalar(rhs)
    }
}

impl std::ops::Mul<&BlockMatrix<f64>> for f64 {
    type Output = BlockMatrix<f64>;

    fn mul(self, rhs: &BlockMatrix<f64>) -> BlockMatrix<f64> {
        rhs.map(|x| self * x)
    }
}

impl std::ops::Mul<&BlockMatrix<c64>> for c64 {
    type Output = BlockMatrix<c64>;

    fn mul(self, rhs: &BlockMatrix<c64>) -> BlockMatrix<c64> {
        rhs.map(|x| self * x)
    }
}

impl std::ops::Div<&BlockMatrix<f64>> for f64 {
    type Output = BlockMatrix<f64>;

    fn div(self, rhs: &BlockMatrix<f64>) -> BlockMatrix<f64> {
        rhs.rdiv_scalar(self)
    }
}

impl std::ops::Div<&BlockMatrix<c64>> for c64 {
    type Output = BlockMatrix<c64>;

    fn div(self, rhs: &BlockMatrix<c64>) -> BlockMatrix<c64> {
        rhs.rdiv_scalar(self)
    }
}

impl std::ops::Not for &BlockMatrix<bool> {
    type Output = BlockMatrix<bool>;

    fn not(self) -> BlockMatrix<bool> {
        BlockMatrix::not(self)
    }
}
