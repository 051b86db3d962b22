use ndarray::{ArrayView2, Axis};

use crate::error::{DensityTreeError, Result};
use crate::gaussian::Moments;

pub mod candidates;
pub mod params;
pub mod partition;

use candidates::{sorted_order, threshold_positions};
pub use params::CandidateDimsParams;
pub use partition::{partition, Partition};

#[derive(Debug, Clone, PartialEq)]
pub struct SplitCandidate {
    pub dimension: usize,
    pub threshold: f64,
    /// Size-weighted mean of the two sides' Gaussian entropies.
    pub score: f64,
    pub n_left: usize,
    pub n_right: usize,
}

pub fn weighted_entropy(n_left: usize, h_left: f64, n_right: usize, h_right: f64) -> f64 {
    let n = (n_left + n_right) as f64;
    (n_left as f64 * h_left + n_right as f64 * h_right) / n
}

/// Finds the `(dimension, threshold)` minimising the weighted child entropy.
///
/// Every distinct observed value of each candidate dimension (except the
/// largest) is tried as a threshold, dimensions in the order given and
/// thresholds ascending; the first minimum found wins. Candidates leaving a
/// side with fewer than `D + 1` points, or with a degenerate covariance, are
/// skipped.
pub fn best_split(subset: ArrayView2<f64>, dims: &[usize]) -> Result<SplitCandidate> {
    let n = subset.nrows();
    let min_side = subset.ncols() + 1;
    if n < 2 * min_side {
        return Err(DensityTreeError::InsufficientData {
            points: n,
            required: 2 * min_side,
        });
    }

    let shift = subset
        .mean_axis(Axis(0))
        .ok_or(DensityTreeError::EmptyDataset)?;
    let total = Moments::from_rows(subset, shift.clone());

    let mut best: Option<SplitCandidate> = None;
    for &dim in dims {
        let column = subset.column(dim);
        let order = sorted_order(column);

        let mut left = Moments::new(shift.clone());
        let mut added = 0;
        for (n_left, threshold) in threshold_positions(column, &order) {
            while added < n_left {
                left.add(subset.row(order[added]));
                added += 1;
            }

            let n_right = n - n_left;
            if n_left < min_side || n_right < min_side {
                continue;
            }

            let right = total.complement(&left);
            let (Ok(h_left), Ok(h_right)) = (left.entropy(), right.entropy()) else {
                continue;
            };

            let score = weighted_entropy(n_left, h_left, n_right, h_right);
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(SplitCandidate {
                    dimension: dim,
                    threshold,
                    score,
                    n_left,
                    n_right,
                });
            }
        }
    }

    best.ok_or(DensityTreeError::NoInformativeSplit)
}
