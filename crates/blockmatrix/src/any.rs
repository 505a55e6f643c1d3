//! Dynamically typed block matrices.
//!
//! `BlockMatrix<T>` fixes the element type at compile time. When leaves
//! arrive with a runtime type tag (loaders, bindings), build an
//! [`AnyBlockMatrix`] instead: the element type is taken from the first
//! leaf and every other leaf must agree with it.

use crate::block_matrix::{Block, BlockMatrix};
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::scalar::{Element, ElementType, c64};

/// Dense leaf of any supported element type.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDense {
    Bool(DenseMatrix<bool>),
    Float64(DenseMatrix<f64>),
    Complex128(DenseMatrix<c64>),
}

/// Block matrix of any supported element type.
#[derive(Debug, Clone)]
pub enum AnyBlockMatrix {
    Bool(BlockMatrix<bool>),
    Float64(BlockMatrix<f64>),
    Complex128(BlockMatrix<c64>),
}

/// Untyped grid entry: a leaf or a nested matrix.
#[derive(Debug, Clone)]
pub enum AnyBlock {
    Leaf(AnyDense),
    Node(AnyBlockMatrix),
}

/// Element types that can be recovered from the dynamic wrappers.
pub trait FromAny: Element {
    fn from_any_dense(dense: AnyDense) -> Option<DenseMatrix<Self>>;
    fn from_any_matrix(matrix: AnyBlockMatrix) -> Option<BlockMatrix<Self>>;
}

macro_rules! impl_any_variant {
    ($t:ty, $variant:ident) => {
        impl FromAny for $t {
            fn from_any_dense(dense: AnyDense) -> Option<DenseMatrix<$t>> {
                match dense {
                    AnyDense::$variant(d) => Some(d),
                    _ => None,
                }
            }

            fn from_any_matrix(matrix: AnyBlockMatrix) -> Option<BlockMatrix<$t>> {
                match matrix {
                    AnyBlockMatrix::$variant(m) => Some(m),
                    _ => None,
                }
            }
        }

        impl From<DenseMatrix<$t>> for AnyDense {
            fn from(dense: DenseMatrix<$t>) -> Self {
                AnyDense::$variant(dense)
            }
        }

        impl From<BlockMatrix<$t>> for AnyBlockMatrix {
            fn from(matrix: BlockMatrix<$t>) -> Self {
                AnyBlockMatrix::$variant(matrix)
            }
        }
    };
}

impl_any_variant!(bool, Bool);
impl_any_variant!(f64, Float64);
impl_any_variant!(c64, Complex128);

impl AnyDense {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Bool(_) => ElementType::Bool,
            Self::Float64(_) => ElementType::Float64,
            Self::Complex128(_) => ElementType::Complex128,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Bool(d) => d.shape(),
            Self::Float64(d) => d.shape(),
            Self::Complex128(d) => d.shape(),
        }
    }
}

impl AnyBlock {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Leaf(leaf) => leaf.element_type(),
            Self::Node(node) => node.element_type(),
        }
    }
}

impl From<AnyDense> for AnyBlock {
    fn from(leaf: AnyDense) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<AnyBlockMatrix> for AnyBlock {
    fn from(node: AnyBlockMatrix) -> Self {
        Self::Node(node)
    }
}

impl AnyBlockMatrix {
    /// Build from a grid of untyped blocks.
    ///
    /// # Errors
    ///
    /// - `EmptyGrid` if the grid has no blocks.
    /// - `TypeMismatch` if a block's element type differs from the first block's.
    /// - Any construction error of [`BlockMatrix::new`].
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::{AnyBlock, AnyBlockMatrix, AnyDense, DenseMatrix, ElementType, c64};
    ///
    /// let re = AnyBlock::Leaf(AnyDense::from(DenseMatrix::filled(1, 1, 1.0)));
    /// let z = AnyBlock::Leaf(AnyDense::from(DenseMatrix::filled(1, 1, c64::new(0.0, 1.0))));
    ///
    /// let m = AnyBlockMatrix::new(vec![vec![re.clone(), re.clone()]]).unwrap();
    /// assert_eq!(m.element_type(), ElementType::Float64);
    /// assert!(AnyBlockMatrix::new(vec![vec![re, z]]).is_err());
    /// ```
    pub fn new(grid: Vec<Vec<AnyBlock>>) -> Result<Self> {
        let expected = grid
            .first()
            .and_then(|row| row.first())
            .ok_or(BlockMatrixError::EmptyGrid)?
            .element_type();
        Ok(match expected {
            ElementType::Bool => Self::Bool(BlockMatrix::new(typed_grid(grid, expected)?)?),
            ElementType::Float64 => Self::Float64(BlockMatrix::new(typed_grid(grid, expected)?)?),
            ElementType::Complex128 => {
                Self::Complex128(BlockMatrix::new(typed_grid(grid, expected)?)?)
            }
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Bool(_) => ElementType::Bool,
            Self::Float64(_) => ElementType::Float64,
            Self::Complex128(_) => ElementType::Complex128,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Bool(m) => m.shape(),
            Self::Float64(m) => m.shape(),
            Self::Complex128(m) => m.shape(),
        }
    }

    pub fn nb_blocks(&self) -> (usize, usize) {
        match self {
            Self::Bool(m) => m.nb_blocks(),
            Self::Float64(m) => m.nb_blocks(),
            Self::Complex128(m) => m.nb_blocks(),
        }
    }

    /// Flatten into a dense leaf of the same element type.
    pub fn flatten(&self) -> AnyDense {
        match self {
            Self::Bool(m) => AnyDense::Bool(m.flatten()),
            Self::Float64(m) => AnyDense::Float64(m.flatten()),
            Self::Complex128(m) => AnyDense::Complex128(m.flatten()),
        }
    }

    /// Typed view, if the element type is `T`.
    pub fn into_typed<T: FromAny>(self) -> Result<BlockMatrix<T>> {
        let found = self.element_type();
        T::from_any_matrix(self).ok_or(BlockMatrixError::TypeMismatch {
            expected: T::ELEMENT_TYPE,
            found,
        })
    }
}

fn typed_grid<T: FromAny>(
    grid: Vec<Vec<AnyBlock>>,
    expected: ElementType,
) -> Result<Vec<Vec<Block<T>>>> {
    grid.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|block| {
                    let found = block.element_type();
                    let typed = match block {
                        AnyBlock::Leaf(leaf) => T::from_any_dense(leaf).map(Block::Leaf),
                        AnyBlock::Node(node) => T::from_any_matrix(node).map(Block::Node),
                    };
                    typed.ok_or(BlockMatrixError::TypeMismatch { expected, found })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_leaf(value: f64) -> AnyBlock {
        AnyBlock::Leaf(DenseMatrix::filled(2, 2, value).into())
    }

    #[test]
    fn test_infers_element_type_from_first_leaf() {
        let m = AnyBlockMatrix::new(vec![vec![real_leaf(1.0), real_leaf(2.0)]]).unwrap();
        assert_eq!(m.element_type(), ElementType::Float64);
        assert_eq!(m.shape(), (2, 4));
        assert_eq!(m.nb_blocks(), (1, 2));
        let typed: BlockMatrix<f64> = m.into_typed().unwrap();
        assert_eq!(typed.flatten()[(1, 3)], 2.0);
    }

    #[test]
    fn test_type_mismatch() {
        let z = AnyBlock::Leaf(DenseMatrix::filled(2, 2, c64::new(1.0, 0.0)).into());
        let err = AnyBlockMatrix::new(vec![vec![real_leaf(1.0)], vec![z]]).unwrap_err();
        assert_eq!(
            err,
            BlockMatrixError::TypeMismatch {
                expected: ElementType::Float64,
                found: ElementType::Complex128
            }
        );
    }

    #[test]
    fn test_nested_node_type_checked() {
        let inner = AnyBlockMatrix::new(vec![vec![AnyBlock::Leaf(
            DenseMatrix::filled(2, 2, true).into(),
        )]])
        .unwrap();
        let err = AnyBlockMatrix::new(vec![vec![real_leaf(0.0), AnyBlock::Node(inner)]]).unwrap_err();
        assert!(matches!(
            err,
            BlockMatrixError::TypeMismatch {
                found: ElementType::Bool,
                ..
            }
        ));
    }

    #[test]
    fn test_into_typed_wrong_type() {
        let m = AnyBlockMatrix::new(vec![vec![real_leaf(1.0)]]).unwrap();
        assert!(matches!(
            m.into_typed::<c64>(),
            Err(BlockMatrixError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty() {
        assert!(matches!(
            AnyBlockMatrix::new(vec![]),
            Err(BlockMatrixError::EmptyGrid)
        ));
    }

    #[test]
    fn test_flatten_keeps_type() {
        let m = AnyBlockMatrix::new(vec![vec![real_leaf(3.0)]]).unwrap();
        assert_eq!(m.flatten(), AnyDense::Float64(DenseMatrix::filled(2, 2, 3.0)));
        assert_eq!(m.flatten().shape(), (2, 2));
    }
}
