//! Dense leaf matrices.
//!
//! Leaves are stored in column-major order, the same layout faer uses,
//! so a leaf can be viewed as a faer matrix without copying.

use std::ops::{Index, IndexMut};

use crate::backend::gemm;
use crate::error::{BlockMatrixError, Result};
use crate::scalar::{Element, Promote, Scalar};

/// A dense 2-D matrix, the leaf content of a block matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Element> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Element> DenseMatrix<T> {
    /// Create a matrix with every element set to `value`.
    pub fn filled(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a matrix from column-major data.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DataLength` if `data.len() != nrows * ncols`.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::DenseMatrix;
    ///
    /// let m = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    /// assert_eq!(m[(1, 0)], 2.0); // column-major: second element is (1, 0)
    /// assert_eq!(m[(0, 1)], 3.0);
    /// ```
    pub fn from_vec(data: Vec<T>, nrows: usize, ncols: usize) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(BlockMatrixError::DataLength {
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Create a matrix from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DataLength` if the rows have different lengths.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::DenseMatrix;
    ///
    /// let m = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m[(0, 1)], 2.0);
    /// assert_eq!(m[(1, 0)], 3.0);
    /// ```
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|row| row.len() != ncols) {
            return Err(BlockMatrixError::DataLength {
                expected: ncols,
                actual: bad.len(),
            });
        }
        Ok(Self::from_fn(nrows, ncols, |i, j| rows[i][j]))
    }

    /// Create a matrix by evaluating `f(row, col)` at every position.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Shape as `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column-major data.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get an element, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        self.data.get(col * self.nrows + row)
    }

    /// Contiguous slice of one column.
    #[inline]
    pub fn column(&self, col: usize) -> &[T] {
        &self.data[col * self.nrows..(col + 1) * self.nrows]
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)])
    }

    /// Apply `f` to every element.
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U) -> DenseMatrix<U> {
        DenseMatrix {
            data: self.data.iter().map(|&x| f(x)).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Combine two matrices of identical shape element by element.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::ShapeMismatch` if the shapes differ.
    pub fn zip_map<U: Element, V: Element>(
        &self,
        other: &DenseMatrix<U>,
        f: impl Fn(T, U) -> V,
    ) -> Result<DenseMatrix<V>> {
        if self.shape() != other.shape() {
            return Err(BlockMatrixError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&x, &y)| f(x, y))
            .collect();
        Ok(DenseMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// Write `src` into the region whose top-left corner is `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the region does not fit.
    pub fn copy_from(&mut self, src: &DenseMatrix<T>, row: usize, col: usize) {
        assert!(
            row + src.nrows <= self.nrows && col + src.ncols <= self.ncols,
            "region {}x{} at ({}, {}) does not fit in {}x{}",
            src.nrows,
            src.ncols,
            row,
            col,
            self.nrows,
            self.ncols
        );
        for c in 0..src.ncols {
            let start = (col + c) * self.nrows + row;
            self.data[start..start + src.nrows].copy_from_slice(src.column(c));
        }
    }

    /// Copy a `(height, width)` region of this matrix from `from` to `to`.
    ///
    /// The two regions must not overlap.
    pub fn copy_region(&mut self, from: (usize, usize), to: (usize, usize), size: (usize, usize)) {
        let (height, width) = size;
        for c in 0..width {
            let src = (from.1 + c) * self.nrows + from.0;
            let dst = (to.1 + c) * self.nrows + to.0;
            self.data.copy_within(src..src + height, dst);
        }
    }

    /// Owned copy of a sub-region.
    pub fn submatrix(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        Self::from_fn(nrows, ncols, |i, j| self[(row + i, col + j)])
    }

    /// Nested rows, outer vec is rows.
    pub fn to_nested_vec(&self) -> Vec<Vec<T>> {
        (0..self.nrows)
            .map(|i| (0..self.ncols).map(|j| self[(i, j)]).collect())
            .collect()
    }
}

impl<T: Scalar> DenseMatrix<T> {
    /// Zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::filled(nrows, ncols, T::zero())
    }

    /// Square identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Matrix-vector product with numeric promotion.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DimensionMismatch` if `x.len() != ncols`.
    pub fn matvec<V: Scalar>(&self, x: &[V]) -> Result<Vec<<T as Promote<V>>::Promoted>>
    where
        T: Promote<V>,
    {
        let mut out = vec![<<T as Promote<V>>::Promoted as Scalar>::zero(); self.nrows];
        self.matvec_accumulate(x, &mut out)?;
        Ok(out)
    }

    /// `out += self @ x`.
    pub(crate) fn matvec_accumulate<V: Scalar>(
        &self,
        x: &[V],
        out: &mut [<T as Promote<V>>::Promoted],
    ) -> Result<()>
    where
        T: Promote<V>,
    {
        if x.len() != self.ncols {
            return Err(BlockMatrixError::DimensionMismatch {
                expected: self.ncols,
                actual: x.len(),
            });
        }
        if out.len() != self.nrows {
            return Err(BlockMatrixError::DimensionMismatch {
                expected: self.nrows,
                actual: out.len(),
            });
        }
        for (j, &xj) in x.iter().enumerate() {
            let xj = <T as Promote<V>>::promote_rhs(xj);
            for (o, &a) in out.iter_mut().zip(self.column(j)) {
                *o = *o + a.promote_lhs() * xj;
            }
        }
        Ok(())
    }

    /// Matrix product `self @ other`.
    ///
    /// # Errors
    ///
    /// Returns `BlockMatrixError::DimensionMismatch` if the inner dimensions differ.
    ///
    /// # Example
    ///
    /// ```
    /// use blockmatrix::DenseMatrix;
    ///
    /// let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// let id = DenseMatrix::identity(2);
    /// assert_eq!(a.matmul(&id).unwrap(), a);
    /// ```
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        let mut out = Self::zeros(self.nrows, other.ncols);
        gemm(&mut out, self, other, false)?;
        Ok(out)
    }

    /// `acc += self @ other`.
    pub(crate) fn matmul_accumulate(&self, other: &Self, acc: &mut Self) -> Result<()> {
        gemm(acc, self, other, true)
    }
}

impl<T: Element> Index<(usize, usize)> for DenseMatrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[col * self.nrows + row]
    }
}

impl<T: Element> IndexMut<(usize, usize)> for DenseMatrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[col * self.nrows + row]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_vec_column_major() {
        let m = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(1, 0)], 2.0);
        assert_eq!(m[(0, 2)], 5.0);
        assert_eq!(m[(1, 2)], 6.0);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let result = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0], 2, 3);
        assert!(matches!(
            result,
            Err(BlockMatrixError::DataLength {
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_from_rows_ragged() {
        assert!(DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let m: DenseMatrix<f64> = DenseMatrix::zeros(2, 3);
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m.get(1, 2), Some(&0.0));
    }

    #[test]
    fn test_transpose() {
        let m = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(m[(i, j)], t[(j, i)]);
            }
        }
    }

    #[test]
    fn test_zip_map_shape_mismatch() {
        let a: DenseMatrix<f64> = DenseMatrix::zeros(2, 2);
        let b: DenseMatrix<f64> = DenseMatrix::zeros(2, 3);
        let result = a.zip_map(&b, |x, y| x + y);
        assert!(matches!(result, Err(BlockMatrixError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_division_by_zero_is_not_an_error() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 0.0]]).unwrap();
        let b = DenseMatrix::from_rows(&[vec![0.0, 0.0]]).unwrap();
        let c = a.zip_map(&b, |x, y| x / y).unwrap();
        assert!(c[(0, 0)].is_infinite());
        assert!(c[(0, 1)].is_nan());
    }

    #[test]
    fn test_copy_from_and_region() {
        let mut full: DenseMatrix<f64> = DenseMatrix::zeros(4, 4);
        let block = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        full.copy_from(&block, 0, 2);
        full.copy_region((0, 2), (2, 0), (2, 2));
        assert_eq!(full.submatrix(0, 2, 2, 2), block);
        assert_eq!(full.submatrix(2, 0, 2, 2), block);
        assert_eq!(full[(0, 0)], 0.0);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_copy_from_out_of_bounds() {
        let mut full: DenseMatrix<f64> = DenseMatrix::zeros(2, 2);
        let block: DenseMatrix<f64> = DenseMatrix::zeros(2, 2);
        full.copy_from(&block, 1, 0);
    }

    #[test]
    fn test_matvec_real() {
        let m = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let y = m.matvec(&[1.0, 1.0]).unwrap();
        assert_eq!(y, vec![3.0, 7.0]);
    }

    #[test]
    fn test_matvec_promotes_to_complex() {
        let m = DenseMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let y = m.matvec(&[c64::new(0.0, 1.0), c64::new(1.0, 0.0)]).unwrap();
        assert_eq!(y, vec![c64::new(2.0, 1.0)]);
    }

    #[test]
    fn test_matvec_dimension_mismatch() {
        let m: DenseMatrix<f64> = DenseMatrix::zeros(2, 3);
        assert!(m.matvec(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_matmul() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let b = DenseMatrix::from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0, 11.0, 12.0],
        ])
        .unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), (2, 4));
        let expected = [[38.0, 44.0, 50.0, 56.0], [83.0, 98.0, 113.0, 128.0]];
        for i in 0..2 {
            for j in 0..4 {
                assert_relative_eq!(c[(i, j)], expected[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_to_nested_vec() {
        let m = DenseMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let nested = m.to_nested_vec();
        assert_eq!(nested[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(nested[1], vec![2.0, 4.0, 6.0]);
    }
}
