//! blockmatrix - hierarchical block matrices with shared blocks
//!
//! A [`BlockMatrix`] represents a large matrix as a rectangular grid of
//! blocks. Each block is either a dense leaf or another block matrix, and
//! the same stored block may appear at several grid positions.
//!
//! # Architecture
//!
//! ```text
//! Construction:  block_matrix (validation), builders, any (runtime types)
//!     |
//! Enumeration:   positions   -> stored slots + anchors -> flatten, patches
//!     |
//! Operations:    algebra     -> elementwise maps, comparisons, reductions
//!                product     -> matvec, matmat, compose
//!                transform   -> transpose, fft_of_list / ifft_of_list
//!     |
//! Leaves:        dense, backend (faer GEMM), spectral (1-D DFT)
//! ```
//!
//! Operations never mutate their inputs. Work on distinct stored slots
//! runs in parallel on the rayon pool, and results are collected in grid
//! order, so outputs are deterministic.
//!
//! # Example
//!
//! ```
//! use blockmatrix::{Block, BlockMatrix, DenseMatrix};
//!
//! let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! let b = DenseMatrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
//! let m = BlockMatrix::new(vec![
//!     vec![Block::Leaf(a.clone()), Block::Leaf(b.clone())],
//!     vec![Block::Leaf(b), Block::Leaf(a)],
//! ])
//! .unwrap();
//!
//! assert_eq!(m.shape(), (4, 4));
//! let y = m.matvec(&[1.0, 0.0, 0.0, 0.0]).unwrap();
//! assert_eq!(y, vec![1.0, 3.0, 5.0, 7.0]);
//!
//! let doubled = m.scale(2.0);
//! assert_eq!(doubled.flatten()[(3, 3)], 8.0);
//! ```

pub mod algebra;
pub mod any;
pub mod backend;
pub mod block_matrix;
pub mod builders;
pub mod dense;
pub mod error;
pub mod partition;
pub mod positions;
pub mod product;
pub mod random;
pub mod scalar;
pub mod spectral;
pub mod transform;

pub use any::{AnyBlock, AnyBlockMatrix, AnyDense};
pub use block_matrix::{Block, BlockMatrix, Slot, Validation};
pub use builders::{block_circulant, block_toeplitz, cut_dense, identity_like, zeros_like};
pub use dense::DenseMatrix;
pub use error::{BlockMatrixError, Result};
pub use partition::{BlockDim, BlockShapes};
pub use positions::{Patch, StoredBlock};
pub use product::{Operand, Product};
pub use scalar::{Element, ElementType, Promote, Scalar, c64};
pub use transform::{fft_of_list, ifft_of_list};
