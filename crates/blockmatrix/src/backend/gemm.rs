//! GEMM on dense leaves using faer.

use faer::linalg::matmul::matmul;
use faer::{Accum, Par};

use crate::backend::AsFaerMat;
use crate::dense::DenseMatrix;
use crate::error::{BlockMatrixError, Result};
use crate::scalar::Scalar;

/// `out = a @ b`, or `out += a @ b` when `accumulate` is set.
pub(crate) fn gemm<T: Scalar>(
    out: &mut DenseMatrix<T>,
    a: &DenseMatrix<T>,
    b: &DenseMatrix<T>,
    accumulate: bool,
) -> Result<()> {
    if a.ncols() != b.nrows() {
        return Err(BlockMatrixError::DimensionMismatch {
            expected: a.ncols(),
            actual: b.nrows(),
        });
    }
    if out.shape() != (a.nrows(), b.ncols()) {
        return Err(BlockMatrixError::ShapeMismatch {
            expected: (a.nrows(), b.ncols()),
            actual: out.shape(),
        });
    }

    let accum = if accumulate {
        Accum::Add
    } else {
        Accum::Replace
    };
    let a_mat = a.as_faer_mat();
    let b_mat = b.as_faer_mat();
    let mut out_mat = out.as_faer_mat_mut();
    matmul(out_mat.as_mut(), accum, a_mat, b_mat, T::one(), Par::Seq);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;
    use approx::assert_relative_eq;

    #[test]
    fn test_gemm_accumulate() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let id = DenseMatrix::identity(2);
        let mut out = DenseMatrix::filled(2, 2, 1.0);
        gemm(&mut out, &a, &id, true).unwrap();
        assert_relative_eq!(out[(0, 0)], 2.0);
        assert_relative_eq!(out[(1, 1)], 5.0);
    }

    #[test]
    fn test_gemm_complex() {
        let i = c64::new(0.0, 1.0);
        let a = DenseMatrix::from_rows(&[vec![i]]).unwrap();
        let mut out = DenseMatrix::zeros(1, 1);
        gemm(&mut out, &a, &a, false).unwrap();
        assert_relative_eq!(out[(0, 0)].re, -1.0);
        assert_relative_eq!(out[(0, 0)].im, 0.0);
    }

    #[test]
    fn test_gemm_inner_dimension_mismatch() {
        let a: DenseMatrix<f64> = DenseMatrix::zeros(2, 3);
        let b: DenseMatrix<f64> = DenseMatrix::zeros(2, 3);
        let mut out = DenseMatrix::zeros(2, 3);
        assert!(matches!(
            gemm(&mut out, &a, &b, false),
            Err(BlockMatrixError::DimensionMismatch { .. })
        ));
    }
}
