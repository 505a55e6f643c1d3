//! Zero-copy conversion between dense leaves and faer matrices.

use faer::{MatMut, MatRef};

use crate::dense::DenseMatrix;
use crate::scalar::Scalar;

/// Extension trait for viewing a dense leaf as a faer matrix.
pub trait AsFaerMat<T: Scalar> {
    /// View as an immutable faer matrix (zero-copy).
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::DenseMatrix;
    /// use blockmatrix::backend::AsFaerMat;
    ///
    /// let m = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    /// let view = m.as_faer_mat();
    /// assert_eq!(view.nrows(), 2);
    /// assert_eq!(view.ncols(), 3);
    /// ```
    fn as_faer_mat(&self) -> MatRef<'_, T>;

    /// View as a mutable faer matrix (zero-copy).
    fn as_faer_mat_mut(&mut self) -> MatMut<'_, T>;
}

impl<T: Scalar> AsFaerMat<T> for DenseMatrix<T> {
    fn as_faer_mat(&self) -> MatRef<'_, T> {
        let (rows, cols) = self.shape();
        MatRef::from_column_major_slice(self.data(), rows, cols)
    }

    fn as_faer_mat_mut(&mut self) -> MatMut<'_, T> {
        let (rows, cols) = self.shape();
        MatMut::from_column_major_slice_mut(self.data_mut(), rows, cols)
    }
}
