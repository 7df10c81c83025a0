//! Dense real vector, optionally row-partitioned across ranks.

use std::ops::{Index, IndexMut};

use ndarray::Array1;

use super::{Distribution, LinAlgError};

/// A dense vector of `f64`.
///
/// When distributed, [`Vector::dim`] is the length of this rank's block.
/// `Clone` performs a deep copy of the storage.
#[derive(Debug, Clone)]
pub struct Vector {
    data: Array1<f64>,
    distribution: Distribution,
}

impl Vector {
    /// Create a zero-filled vector. `dim` must be positive.
    pub fn zeros(dim: usize, distribution: Distribution) -> Result<Self, LinAlgError> {
        Self::from_array(Array1::zeros(dim), distribution)
    }

    /// Create a vector holding a copy of `data`.
    pub fn from_slice(data: &[f64], distribution: Distribution) -> Result<Self, LinAlgError> {
        Self::from_array(Array1::from_vec(data.to_vec()), distribution)
    }

    pub fn from_array(data: Array1<f64>, distribution: Distribution) -> Result<Self, LinAlgError> {
        if data.is_empty() {
            return Err(LinAlgError::EmptyDimension(
                "vector dimension must be positive".into(),
            ));
        }
        Ok(Self::from_parts(data, distribution))
    }

    /// Wrap storage already known to be non-empty.
    pub(super) fn from_parts(data: Array1<f64>, distribution: Distribution) -> Self {
        debug_assert!(!data.is_empty());
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data, distribution }
    }

    /// Number of entries held on this rank.
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn distributed(&self) -> bool {
        self.distribution.is_distributed()
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.data
    }

    /// Local entries as a contiguous slice.
    pub fn as_slice(&self) -> &[f64] {
        // Storage is kept in standard layout by every constructor.
        self.data.as_slice().unwrap_or(&[])
    }

    pub fn into_array(self) -> Array1<f64> {
        self.data
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// Value at local index `i`.
    ///
    /// # Panics
    /// If `i >= self.dim()`.
    pub fn item(&self, i: usize) -> f64 {
        self[i]
    }

    /// Mutable reference to the value at local index `i`.
    ///
    /// # Panics
    /// If `i >= self.dim()`.
    pub fn item_mut(&mut self, i: usize) -> &mut f64 {
        &mut self[i]
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.data *= factor;
    }

    /// Element-wise sum. Both operands must share dimension and distribution.
    pub fn add(&self, other: &Vector) -> Result<Vector, LinAlgError> {
        self.check_compatible("add", other)?;
        Ok(Vector {
            data: &self.data + &other.data,
            distribution: self.distribution.clone(),
        })
    }

    /// Inner product, summed across ranks when both operands are distributed.
    pub fn inner_product(&self, other: &Vector) -> Result<f64, LinAlgError> {
        self.check_compatible("inner_product", other)?;
        let mut dot = self.data.dot(&other.data);
        super::reduce_sum(&self.distribution, std::iter::once(&mut dot))?;
        Ok(dot)
    }

    /// Euclidean norm of the (global) vector.
    pub fn norm(&self) -> Result<f64, LinAlgError> {
        Ok(self.inner_product(self)?.sqrt())
    }

    /// Scale to unit norm and return the norm before scaling.
    pub fn normalize(&mut self) -> Result<f64, LinAlgError> {
        let norm = self.norm()?;
        if norm == 0.0 {
            return Err(LinAlgError::ZeroNorm);
        }
        self.scale(1.0 / norm);
        Ok(norm)
    }

    fn check_compatible(&self, op: &'static str, other: &Vector) -> Result<(), LinAlgError> {
        if self.distributed() != other.distributed() {
            return Err(LinAlgError::DistributionMismatch {
                op,
                detail: format!(
                    "lhs distributed={}, rhs distributed={}",
                    self.distributed(),
                    other.distributed()
                ),
            });
        }
        if self.dim() != other.dim() {
            return Err(LinAlgError::DimensionMismatch {
                op,
                detail: format!("lhs dim {} vs rhs dim {}", self.dim(), other.dim()),
            });
        }
        Ok(())
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        assert!(i < self.dim(), "Vector index {} out of range for dim {}", i, self.dim());
        &self.data[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        assert!(i < self.dim(), "Vector index {} out of range for dim {}", i, self.dim());
        &mut self.data[i]
    }
}
