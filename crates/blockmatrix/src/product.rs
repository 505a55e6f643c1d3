//! Matrix-vector and matrix-matrix products.
//!
//! Products are computed block-wise: output block `(i, j)` is the sum over
//! `k` of `self[i, k] @ other[k, j]`. Output blocks are independent and are
//! computed in parallel; each leaf GEMM runs sequentially in faer.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::block_matrix::{Block, BlockMatrix};
use crate::builders::cut_dense;
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::partition::BlockShapes;
use crate::scalar::{Promote, Scalar};

/// Right operand of [`BlockMatrix::compose`].
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T: Scalar> {
    Vector(&'a [T]),
    Dense(&'a DenseMatrix<T>),
    Block(&'a BlockMatrix<T>),
}

/// Result of [`BlockMatrix::compose`]; mirrors the operand kind.
#[derive(Debug, Clone)]
pub enum Product<T: Scalar> {
    Vector(Vec<T>),
    Dense(DenseMatrix<T>),
    Block(BlockMatrix<T>),
}

impl<'a, T: Scalar> From<&'a [T]> for Operand<'a, T> {
    fn from(x: &'a [T]) -> Self {
        Self::Vector(x)
    }
}

impl<'a, T: Scalar> From<&'a DenseMatrix<T>> for Operand<'a, T> {
    fn from(x: &'a DenseMatrix<T>) -> Self {
        Self::Dense(x)
    }
}

impl<'a, T: Scalar> From<&'a BlockMatrix<T>> for Operand<'a, T> {
    fn from(x: &'a BlockMatrix<T>) -> Self {
        Self::Block(x)
    }
}

impl<T: Scalar> BlockMatrix<T> {
    /// Matrix-vector product, with numeric promotion of the result.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DimensionMismatch` if `x.len()` differs
    /// from the number of columns.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix, c64};
    ///
    /// let a = DenseMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
    /// let b = DenseMatrix::from_rows(&[vec![3.0]]).unwrap();
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(a), Block::Leaf(b)]]).unwrap();
    ///
    /// assert_eq!(m.matvec(&[1.0, 1.0, 1.0]).unwrap(), vec![6.0]);
    /// let z = m.matvec(&[c64::new(0.0, 1.0), c64::new(0.0, 0.0), c64::new(0.0, 0.0)]).unwrap();
    /// assert_eq!(z, vec![c64::new(0.0, 1.0)]);
    /// ```
    pub fn matvec<V: Scalar>(&self, x: &[V]) -> Result<Vec<<T as Promote<V>>::Promoted>>
    where
        T: Promote<V>,
    {
        let (nrows, ncols) = self.shape();
        if x.len() != ncols {
            return Err(BlockMatrixError::DimensionMismatch {
                expected: ncols,
                actual: x.len(),
            });
        }

        let shapes = self.block_shapes();
        let segments: Vec<Vec<_>> = (0..self.nb_blocks().0)
            .into_par_iter()
            .map(|i| {
                let zero = <<T as Promote<V>>::Promoted as Scalar>::zero();
                let mut out = vec![zero; shapes.rows().block_size(i)];
                self.accumulate_block_row(i, x, &mut out)?;
                Ok(out)
            })
            .collect::<Result<_>>()?;

        let mut out = Vec::with_capacity(nrows);
        for segment in segments {
            out.extend(segment);
        }
        debug!("matvec {} @ [{}]", self, x.len());
        Ok(out)
    }

    /// `out += self @ x`, block-row by block-row.
    fn matvec_accumulate<V: Scalar>(
        &self,
        x: &[V],
        out: &mut [<T as Promote<V>>::Promoted],
    ) -> Result<()>
    where
        T: Promote<V>,
    {
        let rows = self.block_shapes().rows();
        for i in 0..self.nb_blocks().0 {
            self.accumulate_block_row(i, x, &mut out[rows.block_range(i)])?;
        }
        Ok(())
    }

    fn accumulate_block_row<V: Scalar>(
        &self,
        i: usize,
        x: &[V],
        out: &mut [<T as Promote<V>>::Promoted],
    ) -> Result<()>
    where
        T: Promote<V>,
    {
        let cols = self.block_shapes().cols();
        for j in 0..self.nb_blocks().1 {
            let segment = &x[cols.block_range(j)];
            match self.block(i, j) {
                Block::Leaf(leaf) => leaf.matvec_accumulate(segment, out)?,
                Block::Node(node) => node.matvec_accumulate(segment, out)?,
            }
        }
        Ok(())
    }

    /// Block-wise product of two block matrices.
    ///
    /// The column partition of `self` must equal the row partition of
    /// `other`. The result has the row partition of `self` and the column
    /// partition of `other`.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::IncompatiblePartitions` if the partitions
    /// do not line up.
    pub fn matmat(&self, other: &Self) -> Result<Self> {
        let inner = self.block_shapes().col_widths();
        if inner != other.block_shapes().row_heights() {
            return Err(BlockMatrixError::IncompatiblePartitions {
                left: inner.to_vec(),
                right: other.block_shapes().row_heights().to_vec(),
            });
        }

        let (nrows, nk) = self.nb_blocks();
        let ncols = other.nb_blocks().1;
        let blocks: Vec<Block<T>> = (0..nrows * ncols)
            .into_par_iter()
            .map(|p| {
                let (i, j) = (p / ncols, p % ncols);
                let mut acc = block_product(self.block(i, 0), other.block(0, j))?;
                for k in 1..nk {
                    add_product(&mut acc, self.block(i, k), other.block(k, j))?;
                }
                Ok(acc)
            })
            .collect::<Result<_>>()?;

        let shapes = BlockShapes::new(
            self.block_shapes().rows().clone(),
            other.block_shapes().cols().clone(),
        );
        let out = Self::from_parts(blocks.into_iter().map(Arc::new).collect(), shapes);
        debug!("matmat {} @ {} -> {}", self, other, out);
        Ok(out)
    }

    /// Product with a dense matrix, returned dense.
    ///
    /// The dense operand is cut along the column partition of `self` and
    /// multiplied block-wise.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DimensionMismatch` if `other` has the wrong
    /// number of rows.
    pub fn matmat_dense(&self, other: &DenseMatrix<T>) -> Result<DenseMatrix<T>> {
        if other.nrows() != self.shape().1 {
            return Err(BlockMatrixError::DimensionMismatch {
                expected: self.shape().1,
                actual: other.nrows(),
            });
        }
        let cut = cut_dense(other, self.block_shapes().col_widths(), &[other.ncols()])?;
        Ok(self.matmat(&cut)?.flatten())
    }

    /// Compose with a vector, a dense matrix or a block matrix.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{Block, BlockMatrix, DenseMatrix, Product};
    ///
    /// let m = BlockMatrix::new(vec![vec![Block::Leaf(DenseMatrix::<f64>::identity(2))]]).unwrap();
    /// let x = [3.0, 4.0];
    /// match m.compose(x.as_slice().into()).unwrap() {
    ///     Product::Vector(y) => assert_eq!(y, vec![3.0, 4.0]),
    ///     _ => unreachable!(),
    /// }
    /// ```
    pub fn compose(&self, rhs: Operand<'_, T>) -> Result<Product<T>>
    where
        T: Promote<T, Promoted = T>,
    {
        Ok(match rhs {
            Operand::Vector(x) => Product::Vector(self.matvec(x)?),
            Operand::Dense(d) => Product::Dense(self.matmat_dense(d)?),
            Operand::Block(b) => Product::Block(self.matmat(b)?),
        })
    }
}

/// `a @ b` for two blocks of compatible shape.
fn block_product<T: Scalar>(a: &Block<T>, b: &Block<T>) -> Result<Block<T>> {
    Ok(match (a, b) {
        (Block::Leaf(a), Block::Leaf(b)) => Block::Leaf(a.matmul(b)?),
        (Block::Node(a), Block::Node(b))
            if a.block_shapes().col_widths() == b.block_shapes().row_heights() =>
        {
            Block::Node(a.matmat(b)?)
        }
        (Block::Node(a), Block::Node(b)) => Block::Leaf(a.matmat_dense(&b.flatten())?),
        (Block::Node(a), Block::Leaf(b)) => Block::Leaf(a.matmat_dense(b)?),
        // (a @ b)^T = b^T @ a^T
        (Block::Leaf(a), Block::Node(b)) => {
            Block::Leaf(b.transpose().matmat_dense(&a.transpose())?.transpose())
        }
    })
}

/// `acc += a @ b`.
fn add_product<T: Scalar>(acc: &mut Block<T>, a: &Block<T>, b: &Block<T>) -> Result<()> {
    if let (Block::Leaf(acc), Block::Leaf(a), Block::Leaf(b)) = (&mut *acc, a, b) {
        return a.matmul_accumulate(b, acc);
    }
    let term = block_product(a, b)?;
    *acc = add_blocks(acc, &term)?;
    Ok(())
}

fn add_blocks<T: Scalar>(x: &Block<T>, y: &Block<T>) -> Result<Block<T>> {
    Ok(match (x, y) {
        (Block::Leaf(x), Block::Leaf(y)) => Block::Leaf(x.zip_map(y, |a, b| a + b)?),
        (Block::Node(x), Block::Node(y)) if same_structure(x, y) => Block::Node(x.try_add(y)?),
        // Partial sums nested differently; add densely.
        _ => Block::Leaf(x.to_dense().zip_map(&y.to_dense(), |a, b| a + b)?),
    })
}

/// Equal partitions at every level, with leaves and nodes in the same places.
fn same_structure<T: Scalar>(x: &BlockMatrix<T>, y: &BlockMatrix<T>) -> bool {
    x.block_shapes() == y.block_shapes()
        && x.slots()
            .iter()
            .zip(y.slots())
            .all(|(a, b)| match (a.as_ref(), b.as_ref()) {
                (Block::Leaf(_), Block::Leaf(_)) => true,
                (Block::Node(a), Block::Node(b)) => same_structure(a, b),
                _ => false,
            })
}
