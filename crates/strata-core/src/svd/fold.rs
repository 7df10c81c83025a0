//! Folding a linearly dependent sample into an existing factorization.
//!
//! With the current thin factorization `A = U Σ Vᵗ` and a new sample `s`
//! whose basis coefficients are `c = Uᵗ s`, we look for a replacement
//! `A'` with the same number of columns such that
//! `A' A'ᵗ = A Aᵗ + (U c)(U c)ᵗ`. Taking the symmetric square root
//! `M = (Σ² + c cᵗ)^{1/2}` gives `A' = U M Vᵗ`. The spatial span is unchanged
//! and the singular values of `A'` are the square roots of the eigenvalues
//! of `Σ² + c cᵗ`.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;

/// `(diag(σ)² + c cᵗ)^{1/2}`, the symmetric positive semi-definite root.
///
/// `singular_values` and `coefficients` must have the same length.
pub(crate) fn folded_factor(singular_values: &[f64], coefficients: &[f64]) -> Array2<f64> {
    let k = singular_values.len();
    debug_assert_eq!(k, coefficients.len());

    let gram = DMatrix::<f64>::from_fn(k, k, |i, j| {
        let diag = if i == j {
            singular_values[i] * singular_values[i]
        } else {
            0.0
        };
        diag + coefficients[i] * coefficients[j]
    });

    let eig = SymmetricEigen::new(gram);
    let q = &eig.eigenvectors;
    // Rounding can push zero eigenvalues slightly negative.
    let roots: Vec<f64> = eig.eigenvalues.iter().map(|&l| l.max(0.0).sqrt()).collect();

    Array2::from_shape_fn((k, k), |(i, j)| {
        (0..k).map(|l| q[(i, l)] * roots[l] * q[(j, l)]).sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_coefficients_gives_sigma() {
        let m = folded_factor(&[3.0, 2.0, 0.5], &[0.0, 0.0, 0.0]);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { [3.0, 2.0, 0.5][i] } else { 0.0 };
                assert_abs_diff_eq!(m[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_square_reproduces_gram() {
        let sigma = [2.0, 1.0];
        let c = [0.5, -1.5];
        let m = folded_factor(&sigma, &c);

        // M is symmetric and M * M = Σ² + c cᵗ.
        assert_abs_diff_eq!(m[[0, 1]], m[[1, 0]], epsilon = 1e-12);
        let m2 = m.dot(&m);
        assert_abs_diff_eq!(m2[[0, 0]], 4.0 + 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(m2[[0, 1]], -0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(m2[[1, 1]], 1.0 + 2.25, epsilon = 1e-12);
    }

    #[test]
    fn test_aligned_sample_grows_one_value() {
        // Folding e1 into Σ = I adds 1 to σ1² only.
        let m = folded_factor(&[1.0, 1.0], &[1.0, 0.0]);
        assert_abs_diff_eq!(m[[0, 0]], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m[[1, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[0, 1]], 0.0, epsilon = 1e-12);
    }
}
