use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{DensityTreeError, Result};

/// A pivot counts as singular once it falls below this fraction of its own
/// diagonal entry, i.e. when `1 - R²` of that coordinate against the earlier
/// ones is this small. The test does not depend on the units of each axis.
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Lower-triangular factor `L` of a symmetric positive definite matrix `A = L Lᵀ`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cholesky {
    lower: Array2<f64>,
}

impl Cholesky {
    pub fn factor(a: ArrayView2<f64>) -> Result<Self> {
        let d = a.nrows();
        if d == 0 || d != a.ncols() {
            return Err(DensityTreeError::DegenerateCovariance);
        }
        if a.diag().iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(DensityTreeError::DegenerateCovariance);
        }

        let mut lower = Array2::<f64>::zeros((d, d));
        for j in 0..d {
            let mut pivot = a[[j, j]];
            for k in 0..j {
                pivot -= lower[[j, k]].powi(2);
            }
            // Negated comparison also rejects NaN pivots
            if !(pivot > PIVOT_EPSILON * a[[j, j]]) {
                return Err(DensityTreeError::DegenerateCovariance);
            }
            let l_jj = pivot.sqrt();
            lower[[j, j]] = l_jj;

            for i in (j + 1)..d {
                let mut s = a[[i, j]];
                for k in 0..j {
                    s -= lower[[i, k]] * lower[[j, k]];
                }
                lower[[i, j]] = s / l_jj;
            }
        }

        Ok(Self { lower })
    }

    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// `ln det(A)`, computed from the factor diagonal so it does not underflow.
    pub fn log_determinant(&self) -> f64 {
        2.0 * self.lower.diag().iter().map(|v| v.ln()).sum::<f64>()
    }

    pub fn inverse(&self) -> Array2<f64> {
        let d = self.dim();
        let l = &self.lower;

        // L⁻¹ by forward substitution, column by column
        let mut l_inv = Array2::<f64>::zeros((d, d));
        for j in 0..d {
            l_inv[[j, j]] = 1.0 / l[[j, j]];
            for i in (j + 1)..d {
                let mut s = 0.0;
                for k in j..i {
                    s -= l[[i, k]] * l_inv[[k, j]];
                }
                l_inv[[i, j]] = s / l[[i, i]];
            }
        }

        // A⁻¹ = L⁻ᵀ L⁻¹
        l_inv.t().dot(&l_inv)
    }

    /// Squared Mahalanobis norm `vᵀ A⁻¹ v`.
    pub fn mahalanobis_sq(&self, v: ArrayView1<f64>) -> f64 {
        let d = self.dim();
        let l = &self.lower;
        let mut y = Array1::<f64>::zeros(d);
        for i in 0..d {
            let mut s = v[i];
            for k in 0..i {
                s -= l[[i, k]] * y[k];
            }
            y[i] = s / l[[i, i]];
        }
        y.dot(&y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cholesky_known_matrix() {
        let a = array![[4.0, 2.0, 0.6], [2.0, 2.0, 0.4], [0.6, 0.4, 1.0]];
        let chol = Cholesky::factor(a.view()).unwrap();

        // det = 4*(2-0.16) - 2*(2-0.24) + 0.6*(0.8-1.2)
        let det: f64 = 4.0 * (2.0 - 0.16) - 2.0 * (2.0 - 0.24) + 0.6 * (0.8 - 1.2);
        assert_abs_diff_eq!(chol.log_determinant(), det.ln(), epsilon = 1e-12);

        let product = a.dot(&chol.inverse());
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(product[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_mahalanobis_matches_inverse() {
        let a = array![[2.0, 0.3], [0.3, 0.5]];
        let v = array![1.0, -2.0];
        let chol = Cholesky::factor(a.view()).unwrap();
        let expected = v.dot(&chol.inverse().dot(&v));
        assert_abs_diff_eq!(chol.mahalanobis_sq(v.view()), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert_eq!(
            Cholesky::factor(a.view()).unwrap_err(),
            DensityTreeError::DegenerateCovariance
        );

        let zeros = Array2::<f64>::zeros((3, 3));
        assert!(Cholesky::factor(zeros.view()).is_err());

        // Nearly collinear in correlation terms, whatever the axis scales
        let scaled = array![[1e6, 1e-2 * (1.0 - 1e-12)], [1e-2 * (1.0 - 1e-12), 1e-10]];
        assert!(Cholesky::factor(scaled.view()).is_err());
    }

    #[test]
    fn test_units_far_apart_are_not_singular() {
        let a = array![[1e8, 0.5], [0.5, 1e-8]];
        let chol = Cholesky::factor(a.view()).unwrap();
        let det: f64 = 1e8 * 1e-8 - 0.25;
        assert_abs_diff_eq!(chol.log_determinant(), det.ln(), epsilon = 1e-9);

        let product = a.dot(&chol.inverse());
        assert_abs_diff_eq!(product[[0, 0]], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(product[[1, 1]], 1.0, epsilon = 1e-6);
    }
}
