//! Error types for blockmatrix.

use thiserror::Error;

use crate::scalar::ElementType;

/// Errors that can occur in block matrix operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockMatrixError {
    /// A block matrix needs at least one block-row and one block-column.
    #[error("block grid is empty")]
    EmptyGrid,

    /// Block-rows of the grid have different lengths.
    #[error("ragged block grid: block-row {row} has {found} blocks, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Blocks on the same block-row have different heights.
    #[error("inconsistent height in block-row {row}: block ({row}, {col}) has height {found}, expected {expected}")]
    InconsistentHeight {
        row: usize,
        col: usize,
        expected: usize,
        found: usize,
    },

    /// Blocks on the same block-column have different widths.
    #[error("inconsistent width in block-column {col}: block ({row}, {col}) has width {found}, expected {expected}")]
    InconsistentWidth {
        row: usize,
        col: usize,
        expected: usize,
        found: usize,
    },

    /// Leaves of one tree do not share a single element type.
    #[error("element type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    /// The operation is not defined for these operands.
    ///
    /// This is a soft failure: the caller may try a reflected or
    /// alternative operation before giving up.
    #[error("{operation} not supported: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: String,
    },

    /// Two trees have the same number of blocks but different partitions.
    #[error("block shapes differ: {left:?} vs {right:?}")]
    BlockShapeMismatch {
        left: (Vec<usize>, Vec<usize>),
        right: (Vec<usize>, Vec<usize>),
    },

    /// Shape mismatch between two dense leaves.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Column partition of the left operand differs from the row partition of the right one.
    #[error("incompatible partitions for product: columns {left:?} vs rows {right:?}")]
    IncompatiblePartitions { left: Vec<usize>, right: Vec<usize> },

    /// Operand length does not match the matrix dimension it is multiplied with.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A leaf and a nested block matrix were paired at the same grid position.
    #[error("slot ({row}, {col}) holds a leaf in one operand and a block matrix in the other")]
    SlotKindMismatch { row: usize, col: usize },

    /// A matrix in a batch differs from the first one.
    #[error("matrix {index} of the batch has nb_blocks={found_blocks:?} and shape={found_shape:?}, expected nb_blocks={expected_blocks:?} and shape={expected_shape:?}")]
    BatchMismatch {
        index: usize,
        expected_blocks: (usize, usize),
        found_blocks: (usize, usize),
        expected_shape: (usize, usize),
        found_shape: (usize, usize),
    },

    /// A batched transform was called on an empty list.
    #[error("batched transform needs at least one matrix")]
    EmptyBatch,

    /// Data length does not match the requested dense shape.
    #[error("data length mismatch: expected {expected} elements, got {actual}")]
    DataLength { expected: usize, actual: usize },
}

impl BlockMatrixError {
    /// Whether this is the soft "not supported" signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Whether this error reports inconsistent block or leaf shapes.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::RaggedGrid { .. }
                | Self::InconsistentHeight { .. }
                | Self::InconsistentWidth { .. }
                | Self::BlockShapeMismatch { .. }
                | Self::ShapeMismatch { .. }
                | Self::IncompatiblePartitions { .. }
                | Self::DimensionMismatch { .. }
                | Self::DataLength { .. }
        )
    }
}

/// Result type for block matrix operations.
pub type Result<T> = std::result::Result<T, BlockMatrixError>;
