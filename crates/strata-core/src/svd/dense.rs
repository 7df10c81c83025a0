//! Dense SVD solvers.
//!
//! The static SVD hands the globalized sample matrix to a [`DenseSvd`]
//! implementation and only relies on the thin-SVD contract: for an `m x n`
//! input, `U` is `m x k`, `Σ` has `k` non-negative entries in nonincreasing
//! order and `Vᵗ` is `k x n`, with `k = min(m, n)`.
//!
//! - [`FaerSvd`] (default): `faer` thin SVD.
//! - [`NalgebraSvd`]: `nalgebra` implicit-shift SVD with an explicit
//!   iteration cap, reporting non-convergence instead of returning garbage.

use nalgebra::{DMatrix, SVD};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use thiserror::Error;

/// Errors from a dense SVD solve.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("SVD failed to converge within {max_iterations} iterations")]
    NoConvergence { max_iterations: usize },

    #[error("SVD input or output contains non-finite values")]
    NonFinite,

    #[error("Invalid SVD input: {0}")]
    Shape(String),
}

/// Thin singular value decomposition `A = U Σ Vᵗ`.
#[derive(Debug, Clone)]
pub struct ThinSvd {
    /// Left singular vectors, `m x k`.
    pub u: Array2<f64>,
    /// Singular values, length `k`, nonincreasing.
    pub singular_values: Array1<f64>,
    /// Right singular vectors, transposed, `k x n`.
    pub vt: Array2<f64>,
}

impl ThinSvd {
    /// Number of singular triplets.
    pub fn rank_bound(&self) -> usize {
        self.singular_values.len()
    }

    /// `U Σ Vᵗ`.
    pub fn reconstruct(&self) -> Array2<f64> {
        let mut us = self.u.clone();
        for (mut col, &s) in us.columns_mut().into_iter().zip(self.singular_values.iter()) {
            col *= s;
        }
        us.dot(&self.vt)
    }

    /// Check finiteness and put the triplets in nonincreasing order.
    ///
    /// The sort is stable, so triplets with equal singular values keep the
    /// solver's order.
    fn finish(self) -> Result<Self, SolverError> {
        let finite = self.u.iter().all(|v| v.is_finite())
            && self.singular_values.iter().all(|v| v.is_finite())
            && self.vt.iter().all(|v| v.is_finite());
        if !finite {
            return Err(SolverError::NonFinite);
        }

        let k = self.rank_bound();
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&a, &b| {
            self.singular_values[b]
                .partial_cmp(&self.singular_values[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if order.iter().enumerate().all(|(i, &j)| i == j) {
            return Ok(self);
        }

        let (m, n) = (self.u.nrows(), self.vt.ncols());
        Ok(ThinSvd {
            u: Array2::from_shape_fn((m, k), |(i, j)| self.u[[i, order[j]]]),
            singular_values: Array1::from_shape_fn(k, |i| self.singular_values[order[i]]),
            vt: Array2::from_shape_fn((k, n), |(i, j)| self.vt[[order[i], j]]),
        })
    }
}

/// A dense SVD backend.
pub trait DenseSvd: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Thin SVD of `a`.
    fn thin_svd(&self, a: &Array2<f64>) -> Result<ThinSvd, SolverError>;
}

fn check_input(a: &Array2<f64>) -> Result<(), SolverError> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(SolverError::Shape(format!(
            "matrix must be non-empty, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if !a.iter().all(|v| v.is_finite()) {
        return Err(SolverError::NonFinite);
    }
    Ok(())
}

/// Thin SVD via `faer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSvd;

impl DenseSvd for FaerSvd {
    fn name(&self) -> &str {
        "faer"
    }

    fn thin_svd(&self, a: &Array2<f64>) -> Result<ThinSvd, SolverError> {
        check_input(a)?;
        let (m, n) = a.dim();
        let k = m.min(n);

        // Convert ndarray to faer Mat<f64>
        let mat = faer::Mat::<f64>::from_fn(m, n, |i, j| a[[i, j]]);
        let svd = mat.thin_svd();

        let u = svd.u();
        let s = svd.s_diagonal();
        let v = svd.v();

        ThinSvd {
            u: Array2::from_shape_fn((m, k), |(i, j)| u.read(i, j)),
            singular_values: Array1::from_shape_fn(k, |i| s.read(i)),
            vt: Array2::from_shape_fn((k, n), |(i, j)| v.read(j, i)),
        }
        .finish()
    }
}

/// SVD via `nalgebra` with bounded iterations.
#[derive(Debug, Clone, Copy)]
pub struct NalgebraSvd {
    /// Convergence threshold on the off-diagonal entries.
    pub eps: f64,
    /// Maximum number of implicit-shift iterations.
    pub max_iterations: usize,
}

impl Default for NalgebraSvd {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            max_iterations: 10_000,
        }
    }
}

impl DenseSvd for NalgebraSvd {
    fn name(&self) -> &str {
        "nalgebra"
    }

    fn thin_svd(&self, a: &Array2<f64>) -> Result<ThinSvd, SolverError> {
        check_input(a)?;
        let (m, n) = a.dim();

        let mat = DMatrix::<f64>::from_fn(m, n, |i, j| a[[i, j]]);
        let svd = SVD::try_new(mat, true, true, self.eps, self.max_iterations).ok_or(
            SolverError::NoConvergence {
                max_iterations: self.max_iterations,
            },
        )?;

        let u = svd
            .u
            .ok_or_else(|| SolverError::Shape("left singular vectors not computed".into()))?;
        let vt = svd
            .v_t
            .ok_or_else(|| SolverError::Shape("right singular vectors not computed".into()))?;
        let k = svd.singular_values.len();

        ThinSvd {
            u: Array2::from_shape_fn((m, k), |(i, j)| u[(i, j)]),
            singular_values: Array1::from_shape_fn(k, |i| svd.singular_values[i]),
            vt: Array2::from_shape_fn((k, n), |(i, j)| vt[(i, j)]),
        }
        .finish()
    }
}

/// Solver selection for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Faer,
    Nalgebra,
}

impl SolverKind {
    pub fn build(self) -> Box<dyn DenseSvd> {
        match self {
            SolverKind::Faer => Box::new(FaerSvd),
            SolverKind::Nalgebra => Box::new(NalgebraSvd::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn backends() -> Vec<Box<dyn DenseSvd>> {
        vec![SolverKind::Faer.build(), SolverKind::Nalgebra.build()]
    }

    fn test_matrix() -> Array2<f64> {
        array![
            [2.0, -1.0, 0.5],
            [0.0, 3.0, 1.0],
            [1.0, 1.0, -2.0],
            [4.0, 0.0, 0.25],
            [-1.0, 2.0, 1.5],
        ]
    }

    #[test]
    fn test_reconstruction() {
        let a = test_matrix();
        for solver in backends() {
            let svd = solver.thin_svd(&a).unwrap();
            assert_eq!(svd.u.dim(), (5, 3), "{}", solver.name());
            assert_eq!(svd.vt.dim(), (3, 3), "{}", solver.name());

            let r = svd.reconstruct();
            for (x, y) in r.iter().zip(a.iter()) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_wide_matrix_shapes() {
        let a = test_matrix().t().to_owned();
        for solver in backends() {
            let svd = solver.thin_svd(&a).unwrap();
            assert_eq!(svd.u.dim(), (3, 3));
            assert_eq!(svd.singular_values.len(), 3);
            assert_eq!(svd.vt.dim(), (3, 5));
        }
    }

    #[test]
    fn test_singular_values_nonincreasing_and_backends_agree() {
        let a = test_matrix();
        let faer = FaerSvd.thin_svd(&a).unwrap();
        let nalg = NalgebraSvd::default().thin_svd(&a).unwrap();

        for w in faer.singular_values.as_slice().unwrap().windows(2) {
            assert!(w[0] >= w[1]);
        }
        for (x, y) in faer.singular_values.iter().zip(nalg.singular_values.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_orthonormal_factors() {
        let a = test_matrix();
        for solver in backends() {
            let svd = solver.thin_svd(&a).unwrap();
            let utu = svd.u.t().dot(&svd.u);
            let vvt = svd.vt.dot(&svd.vt.t());
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_abs_diff_eq!(utu[[i, j]], expected, epsilon = 1e-10);
                    assert_abs_diff_eq!(vvt[[i, j]], expected, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut a = test_matrix();
        a[[1, 1]] = f64::NAN;
        for solver in backends() {
            assert!(matches!(solver.thin_svd(&a), Err(SolverError::NonFinite)));
        }
    }

    #[test]
    fn test_finish_sorts_triplets() {
        let svd = ThinSvd {
            u: array![[1.0, 0.0], [0.0, 1.0]],
            singular_values: array![1.0, 3.0],
            vt: array![[1.0, 0.0], [0.0, 1.0]],
        }
        .finish()
        .unwrap();

        assert_eq!(svd.singular_values.to_vec(), vec![3.0, 1.0]);
        assert_eq!(svd.u, array![[0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(svd.vt, array![[0.0, 1.0], [1.0, 0.0]]);

        let r = svd.reconstruct();
        assert_eq!(r, array![[1.0, 0.0], [0.0, 3.0]]);
    }

    #[test]
    fn test_solver_kind_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            solver: SolverKind,
        }
        let w: Wrapper = toml::from_str("solver = \"nalgebra\"").unwrap();
        assert_eq!(w.solver, SolverKind::Nalgebra);
        assert_eq!(w.solver.build().name(), "nalgebra");
    }
}
