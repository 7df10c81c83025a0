//! Dense row-major matrix whose rows may be distributed across ranks.
//!
//! # Supported products
//!
//! | Operation | `self` | `other` | Result |
//! |-----------|--------|---------|--------|
//! | [`Matrix::mult`] | any | undistributed matrix | same layout as `self` |
//! | [`Matrix::mult_vector`] | distributed | undistributed vector | distributed vector |
//! | [`Matrix::transpose_mult`] | any | matrix with the same layout | undistributed |
//! | [`Matrix::transpose_mult_vector`] | distributed | distributed vector | undistributed vector |
//!
//! `mult` never communicates: with a distributed left operand every rank
//! computes its own block of rows of the product. `transpose_mult` contracts
//! over the row dimension, so for distributed operands each rank computes a
//! partial sum over its block and the partials are combined with a
//! collective `all_reduce_sum`. Every rank must therefore call it together.

use std::ops::{Index, IndexMut};

use ndarray::Array2;

use super::{reduce_sum, Distribution, LinAlgError, Vector};

/// A dense matrix of `f64` stored in row-major order.
///
/// [`Matrix::num_rows`] is the size of this rank's row block when the matrix
/// is distributed and the full row count otherwise. [`Matrix::num_columns`]
/// is always global. `Clone` performs a deep copy of the storage; there is no
/// dimensionless (`Default`) matrix.
#[derive(Debug, Clone)]
pub struct Matrix {
    data: Array2<f64>,
    distribution: Distribution,
}

impl Matrix {
    /// Create a zero-filled `num_rows x num_cols` matrix.
    pub fn zeros(
        num_rows: usize,
        num_cols: usize,
        distribution: Distribution,
    ) -> Result<Self, LinAlgError> {
        Self::from_array(Array2::zeros((num_rows, num_cols)), distribution)
    }

    /// Create a matrix from a copy of row-major `data`.
    pub fn from_row_major(
        data: &[f64],
        num_rows: usize,
        num_cols: usize,
        distribution: Distribution,
    ) -> Result<Self, LinAlgError> {
        if data.len() != num_rows * num_cols {
            return Err(LinAlgError::DimensionMismatch {
                op: "from_row_major",
                detail: format!(
                    "{} values supplied for a {}x{} matrix",
                    data.len(),
                    num_rows,
                    num_cols
                ),
            });
        }
        let array = Array2::from_shape_vec((num_rows, num_cols), data.to_vec()).map_err(|e| {
            LinAlgError::DimensionMismatch {
                op: "from_row_major",
                detail: e.to_string(),
            }
        })?;
        Self::from_array(array, distribution)
    }

    /// Wrap an existing array, converting it to row-major layout if needed.
    pub fn from_array(data: Array2<f64>, distribution: Distribution) -> Result<Self, LinAlgError> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(LinAlgError::EmptyDimension(format!(
                "matrix must have positive dimensions, got {}x{}",
                rows, cols
            )));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, distribution })
    }

    /// Undistributed square matrix with `values` on the diagonal.
    pub fn diagonal(values: &[f64]) -> Result<Self, LinAlgError> {
        let n = values.len();
        let mut m = Self::zeros(n, n, Distribution::Undistributed)?;
        for (i, &v) in values.iter().enumerate() {
            m.data[[i, i]] = v;
        }
        Ok(m)
    }

    pub fn distributed(&self) -> bool {
        self.distribution.is_distributed()
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Rows held on this rank.
    pub fn num_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Global number of columns, identical on every rank.
    pub fn num_columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Copy of the local block in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    /// Value at local `(row, col)`.
    ///
    /// # Panics
    /// If `row >= num_rows()` or `col >= num_columns()`.
    pub fn item(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    /// Mutable reference to the value at local `(row, col)`.
    ///
    /// # Panics
    /// If `row >= num_rows()` or `col >= num_columns()`.
    pub fn item_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self[(row, col)]
    }

    /// Checked element access.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get([row, col]).copied()
    }

    /// Copy of local row `row` as an undistributed vector.
    pub fn row(&self, row: usize) -> Vector {
        self.check_bounds(row, 0);
        Vector::from_parts(self.data.row(row).to_owned(), Distribution::Undistributed)
    }

    /// Copy of column `col`, laid out like the matrix's rows.
    pub fn column(&self, col: usize) -> Vector {
        self.check_bounds(0, col);
        Vector::from_parts(self.data.column(col).to_owned(), self.distribution.clone())
    }

    /// Transpose of an undistributed matrix.
    pub fn transpose(&self) -> Result<Matrix, LinAlgError> {
        if self.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op: "transpose",
                detail: "a distributed matrix cannot be transposed locally".into(),
            });
        }
        Matrix::from_array(self.data.t().to_owned(), Distribution::Undistributed)
    }

    /// `self * other`.
    ///
    /// `other` must be undistributed; the product has the layout of `self`.
    pub fn mult(&self, other: &Matrix) -> Result<Matrix, LinAlgError> {
        if other.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op: "mult",
                detail: "right operand must be undistributed".into(),
            });
        }
        if self.num_columns() != other.num_rows() {
            return Err(LinAlgError::DimensionMismatch {
                op: "mult",
                detail: format!(
                    "{}x{} times {}x{}",
                    self.num_rows(),
                    self.num_columns(),
                    other.num_rows(),
                    other.num_columns()
                ),
            });
        }
        Matrix::from_array(self.data.dot(&other.data), self.distribution.clone())
    }

    /// `self * other` for a distributed matrix and an undistributed vector.
    pub fn mult_vector(&self, other: &Vector) -> Result<Vector, LinAlgError> {
        if !self.distributed() || other.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op: "mult_vector",
                detail: format!(
                    "requires a distributed matrix and an undistributed vector, got \
                     matrix distributed={}, vector distributed={}",
                    self.distributed(),
                    other.distributed()
                ),
            });
        }
        if self.num_columns() != other.dim() {
            return Err(LinAlgError::DimensionMismatch {
                op: "mult_vector",
                detail: format!(
                    "{} columns times vector of dim {}",
                    self.num_columns(),
                    other.dim()
                ),
            });
        }
        Vector::from_array(self.data.dot(other.as_array()), self.distribution.clone())
    }

    /// `selfᵀ * other`, always undistributed.
    ///
    /// Both operands must share a layout and a (local) row count. For
    /// distributed operands this is a collective operation.
    pub fn transpose_mult(&self, other: &Matrix) -> Result<Matrix, LinAlgError> {
        if self.distributed() != other.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op: "transpose_mult",
                detail: format!(
                    "lhs distributed={}, rhs distributed={}",
                    self.distributed(),
                    other.distributed()
                ),
            });
        }
        if self.num_rows() != other.num_rows() {
            return Err(LinAlgError::DimensionMismatch {
                op: "transpose_mult",
                detail: format!("{} rows vs {} rows", self.num_rows(), other.num_rows()),
            });
        }

        let mut product = self.data.t().dot(&other.data);
        reduce_sum(&self.distribution, product.iter_mut())?;
        Matrix::from_array(product, Distribution::Undistributed)
    }

    /// `selfᵀ * other` for a distributed matrix and a distributed vector.
    ///
    /// Collective; the result is undistributed.
    pub fn transpose_mult_vector(&self, other: &Vector) -> Result<Vector, LinAlgError> {
        if !self.distributed() || !other.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op: "transpose_mult_vector",
                detail: format!(
                    "requires distributed operands, got matrix distributed={}, \
                     vector distributed={}",
                    self.distributed(),
                    other.distributed()
                ),
            });
        }
        if self.num_rows() != other.dim() {
            return Err(LinAlgError::DimensionMismatch {
                op: "transpose_mult_vector",
                detail: format!("{} rows vs vector of dim {}", self.num_rows(), other.dim()),
            });
        }

        let mut product = self.data.t().dot(other.as_array());
        reduce_sum(&self.distribution, product.iter_mut())?;
        Vector::from_array(product, Distribution::Undistributed)
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.num_rows() && col < self.num_columns(),
            "Matrix index ({}, {}) out of range for local {}x{} block",
            row,
            col,
            self.num_rows(),
            self.num_columns()
        );
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        self.check_bounds(row, col);
        &self.data[[row, col]]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        self.check_bounds(row, col);
        &mut self.data[[row, col]]
    }
}
