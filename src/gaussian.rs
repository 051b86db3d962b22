use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{DensityTreeError, Result};

pub mod linalg;

use linalg::Cholesky;

/// Gaussian fitted to a point subset, with the factors needed to evaluate its density.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    pub mean: Array1<f64>,
    pub cov: Array2<f64>,
    pub cov_det: f64,
    pub log_cov_det: f64,
    pub cov_inv: Array2<f64>,
    pub entropy: f64,
    pub peak_density: f64,
    chol: Cholesky,
}

impl Gaussian {
    /// Fits mean and unbiased covariance. Needs at least `D + 1` points and a
    /// covariance that is numerically positive definite.
    pub fn fit(subset: ArrayView2<f64>) -> Result<Self> {
        let required = subset.ncols() + 1;
        if subset.nrows() < required {
            return Err(DensityTreeError::InsufficientData {
                points: subset.nrows(),
                required,
            });
        }
        let (mean, cov) = mean_cov(subset)?;
        Self::from_moments(mean, cov)
    }

    pub fn from_moments(mean: Array1<f64>, cov: Array2<f64>) -> Result<Self> {
        let chol = Cholesky::factor(cov.view())?;
        let log_cov_det = chol.log_determinant();
        let cov_det = log_cov_det.exp();
        let cov_inv = chol.inverse();
        let entropy = entropy_from_log_det(mean.len(), log_cov_det);
        let peak_density = normal_density(mean.view(), mean.view(), cov_det, cov_inv.view());

        Ok(Self {
            mean,
            cov,
            cov_det,
            log_cov_det,
            cov_inv,
            entropy,
            peak_density,
            chol,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn log_density(&self, x: ArrayView1<f64>) -> f64 {
        let diff = &x - &self.mean;
        let maha = self.chol.mahalanobis_sq(diff.view());
        -0.5 * (self.dim() as f64 * (2.0 * PI).ln() + self.log_cov_det + maha)
    }

    pub fn density(&self, x: ArrayView1<f64>) -> f64 {
        self.log_density(x).exp()
    }
}

/// Sample mean and unbiased (`n - 1`) covariance.
pub fn mean_cov(subset: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = subset.nrows();
    if n < 2 {
        return Err(DensityTreeError::InsufficientData {
            points: n,
            required: 2,
        });
    }
    let mean = subset
        .mean_axis(Axis(0))
        .ok_or(DensityTreeError::EmptyDataset)?;
    let centered = &subset - &mean;
    let cov = centered.t().dot(&centered) / (n - 1) as f64;
    Ok((mean, cov))
}

/// `h = ½ ln((2πe)^D det Σ)`; negative for tight distributions.
pub fn entropy_from_log_det(dim: usize, log_det: f64) -> f64 {
    0.5 * (dim as f64 * (1.0 + (2.0 * PI).ln()) + log_det)
}

/// Differential entropy of the Gaussian fitted to `subset`.
pub fn entropy(subset: ArrayView2<f64>) -> Result<f64> {
    let required = subset.ncols() + 1;
    if subset.nrows() < required {
        return Err(DensityTreeError::InsufficientData {
            points: subset.nrows(),
            required,
        });
    }
    let (_, cov) = mean_cov(subset)?;
    let chol = Cholesky::factor(cov.view())?;
    Ok(entropy_from_log_det(subset.ncols(), chol.log_determinant()))
}

/// Multivariate normal density at `x` from a precomputed determinant and inverse.
pub fn normal_density(
    x: ArrayView1<f64>,
    mean: ArrayView1<f64>,
    cov_det: f64,
    cov_inv: ArrayView2<f64>,
) -> f64 {
    let d = mean.len() as f64;
    let diff = &x - &mean;
    let maha = diff.dot(&cov_inv.dot(&diff));
    let norm = ((2.0 * PI).powf(d) * cov_det).sqrt();
    (-0.5 * maha).exp() / norm
}

/// Peak value of the density, reached at its own mean.
pub fn density_at_mean(mean: ArrayView1<f64>, cov_det: f64, cov_inv: ArrayView2<f64>) -> f64 {
    normal_density(mean, mean, cov_det, cov_inv)
}

/// Running first and second moments of rows, accumulated around a fixed shift
/// to keep the subtraction in `covariance` well conditioned.
#[derive(Debug, Clone)]
pub struct Moments {
    n: usize,
    shift: Array1<f64>,
    sum: Array1<f64>,
    outer: Array2<f64>,
}

impl Moments {
    pub fn new(shift: Array1<f64>) -> Self {
        let d = shift.len();
        Self {
            n: 0,
            shift,
            sum: Array1::zeros(d),
            outer: Array2::zeros((d, d)),
        }
    }

    pub fn from_rows(rows: ArrayView2<f64>, shift: Array1<f64>) -> Self {
        let mut moments = Self::new(shift);
        for row in rows.axis_iter(Axis(0)) {
            moments.add(row);
        }
        moments
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn add(&mut self, row: ArrayView1<f64>) {
        let c = &row - &self.shift;
        let d = c.len();
        for i in 0..d {
            self.sum[i] += c[i];
            for j in i..d {
                self.outer[[i, j]] += c[i] * c[j];
            }
        }
        self.n += 1;
    }

    /// Moments of the rows in `self` that are not in `part`.
    pub fn complement(&self, part: &Moments) -> Moments {
        Moments {
            n: self.n - part.n,
            shift: self.shift.clone(),
            sum: &self.sum - &part.sum,
            outer: &self.outer - &part.outer,
        }
    }

    pub fn covariance(&self) -> Array2<f64> {
        let n = self.n as f64;
        let m = &self.sum / n;
        let d = m.len();
        let mut cov = Array2::<f64>::zeros((d, d));
        for i in 0..d {
            for j in i..d {
                let v = (self.outer[[i, j]] - n * m[i] * m[j]) / (n - 1.0);
                cov[[i, j]] = v;
                cov[[j, i]] = v;
            }
        }
        cov
    }

    pub fn entropy(&self) -> Result<f64> {
        let d = self.shift.len();
        if self.n < d + 1 {
            return Err(DensityTreeError::InsufficientData {
                points: self.n,
                required: d + 1,
            });
        }
        let chol = Cholesky::factor(self.covariance().view())?;
        Ok(entropy_from_log_det(d, chol.log_determinant()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, s};

    fn setup_data() -> Array2<f64> {
        array![
            [0.1, 1.2],
            [0.4, 0.7],
            [-0.3, 1.9],
            [1.1, 0.2],
            [0.8, 1.4],
            [-0.6, 0.9],
            [0.2, 0.3]
        ]
    }

    #[test]
    fn test_mean_cov_unbiased() {
        let x = array![[1.0, 2.0], [3.0, 6.0], [5.0, 7.0]];
        let (mean, cov) = mean_cov(x.view()).unwrap();
        assert_abs_diff_eq!(mean, array![3.0, 5.0], epsilon = 1e-12);
        // var(x0) = (4 + 0 + 4) / 2, var(x1) = (9 + 1 + 4) / 2, cov = (6 + 0 + 4) / 2
        assert_abs_diff_eq!(cov, array![[4.0, 5.0], [5.0, 7.0]], epsilon = 1e-12);
    }

    #[test]
    fn test_entropy_of_diagonal_covariance() {
        let mean = array![0.0, 0.0];
        let cov = array![[2.0, 0.0], [0.0, 0.5]];
        let g = Gaussian::from_moments(mean, cov).unwrap();
        let expected = 0.5 * (2.0 * (1.0 + (2.0 * PI).ln()) + (1.0_f64).ln());
        assert_abs_diff_eq!(g.entropy, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(g.cov_det, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_entropy_can_be_negative() {
        let x = setup_data() * 1e-3;
        let h = entropy(x.view()).unwrap();
        assert!(h < 0.0, "Tight cluster should have negative entropy, got {h}");
    }

    #[test]
    fn test_fit_entropy_matches_direct_entropy() {
        let x = setup_data();
        let g = Gaussian::fit(x.view()).unwrap();
        assert_abs_diff_eq!(g.entropy, entropy(x.view()).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_peak_density() {
        let mean = array![1.0, -1.0, 0.5];
        let cov = Array2::<f64>::eye(3);
        let g = Gaussian::from_moments(mean.clone(), cov).unwrap();
        let expected = (2.0 * PI).powf(-1.5);
        assert_abs_diff_eq!(g.peak_density, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(
            density_at_mean(mean.view(), g.cov_det, g.cov_inv.view()),
            expected,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(g.density(mean.view()), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_density_away_from_mean() {
        let g = Gaussian::from_moments(array![0.0], array![[4.0]]).unwrap();
        let x = array![2.0];
        let expected = (-0.5_f64).exp() / (2.0 * PI * 4.0).sqrt();
        assert_abs_diff_eq!(
            normal_density(x.view(), g.mean.view(), g.cov_det, g.cov_inv.view()),
            expected,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(g.log_density(x.view()), expected.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_log_density_with_correlated_covariance() {
        let g = Gaussian::from_moments(array![1.0, -1.0], array![[2.0, 0.6], [0.6, 0.5]]).unwrap();
        let x = array![0.3, 0.2];
        let direct = normal_density(x.view(), g.mean.view(), g.cov_det, g.cov_inv.view());
        assert_abs_diff_eq!(g.log_density(x.view()), direct.ln(), epsilon = 1e-10);
        assert_abs_diff_eq!(g.density(x.view()), direct, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_and_degenerate() {
        let x = setup_data();
        assert_eq!(
            Gaussian::fit(x.slice(s![..2, ..])).unwrap_err(),
            DensityTreeError::InsufficientData {
                points: 2,
                required: 3
            }
        );

        // All points on a line: rank-deficient covariance
        let line = array![[0.0, 0.0], [1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert_eq!(
            Gaussian::fit(line.view()).unwrap_err(),
            DensityTreeError::DegenerateCovariance
        );
        assert!(entropy(line.view()).is_err());
    }

    #[test]
    fn test_moments_match_batch_fit() {
        let x = setup_data();
        let shift = x.mean_axis(Axis(0)).unwrap();
        let total = Moments::from_rows(x.view(), shift.clone());
        let head = Moments::from_rows(x.slice(s![..3, ..]), shift);
        let tail = total.complement(&head);

        let (_, cov) = mean_cov(x.slice(s![3.., ..])).unwrap();
        assert_eq!(tail.count(), 4);
        assert_abs_diff_eq!(tail.covariance(), cov, epsilon = 1e-12);
        assert_abs_diff_eq!(
            tail.entropy().unwrap(),
            entropy(x.slice(s![3.., ..])).unwrap(),
            epsilon = 1e-10
        );
    }
}
