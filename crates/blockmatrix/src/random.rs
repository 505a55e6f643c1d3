//! Random leaves and block matrices.
//!
//! Used by tests and benchmarks; pass a seeded RNG for reproducible results.

use std::sync::Arc;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::block_matrix::{Block, BlockMatrix};
use crate::dense::DenseMatrix;
use crate::partition::BlockShapes;
use crate::scalar::{Scalar, c64};

/// Trait for types that can be randomly sampled from a normal distribution.
pub trait RandomNormal: Scalar {
    /// Sample a random value from the standard normal distribution.
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for c64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        // Real and imaginary parts are N(0, 1/2), so E|z|^2 = 1.
        let scale = std::f64::consts::FRAC_1_SQRT_2;
        c64::new(
            rng.sample::<f64, _>(StandardNormal) * scale,
            rng.sample::<f64, _>(StandardNormal) * scale,
        )
    }
}

impl<T: RandomNormal> DenseMatrix<T> {
    /// Dense leaf with standard normal random values.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::DenseMatrix;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let a: DenseMatrix<f64> = DenseMatrix::randn_with_rng(2, 3, &mut StdRng::seed_from_u64(42));
    /// let b: DenseMatrix<f64> = DenseMatrix::randn_with_rng(2, 3, &mut StdRng::seed_from_u64(42));
    /// assert_eq!(a, b);
    /// ```
    pub fn randn_with_rng<R: Rng>(nrows: usize, ncols: usize, rng: &mut R) -> Self {
        Self::from_fn(nrows, ncols, |_, _| T::sample_normal(rng))
    }
}

impl<T: RandomNormal> BlockMatrix<T> {
    /// Block matrix of the given partition with standard normal leaves.
    ///
    /// Every position gets its own leaf; nothing is shared.
    pub fn randn_with_rng<R: Rng>(shapes: &BlockShapes, rng: &mut R) -> Self {
        let (nrows, ncols) = shapes.nb_blocks();
        let mut slots = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                let (h, w) = shapes.block_shape(i, j);
                slots.push(Arc::new(Block::Leaf(DenseMatrix::randn_with_rng(h, w, rng))));
            }
        }
        Self::from_parts(slots, shapes.clone())
    }
}
