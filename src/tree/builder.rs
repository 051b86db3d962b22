use log::trace;
use ndarray::{ArrayView2, Axis};

use crate::error::Result;
use crate::gaussian::Gaussian;
use crate::split::candidates::candidate_dims;
use crate::split::partition::split_indices;
use crate::split::{best_split, weighted_entropy, CandidateDimsParams};

use super::node::{NodeSplit, SideSummary};

/// A split chosen for one subset, with both sides fitted.
#[derive(Debug)]
pub(crate) struct EvaluatedSplit {
    pub split: NodeSplit,
    /// Entropy of the node minus the weighted entropy of its two sides.
    pub improvement: f64,
    pub left_indices: Vec<usize>,
    pub right_indices: Vec<usize>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GrowthOutcome {
    pub cancelled: bool,
    pub truncated_branches: usize,
}

impl GrowthOutcome {
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            truncated_branches: 0,
        }
    }

    pub fn truncated() -> Self {
        Self {
            cancelled: false,
            truncated_branches: 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            cancelled: self.cancelled || other.cancelled,
            truncated_branches: self.truncated_branches + other.truncated_branches,
        }
    }
}

/// The steps both growth strategies share: search, partition and fit.
#[derive(Debug)]
pub(crate) struct SplitEvaluator<'a> {
    x: ArrayView2<'a, f64>,
    candidate_dims: CandidateDimsParams,
}

impl<'a> SplitEvaluator<'a> {
    pub fn new(x: ArrayView2<'a, f64>, candidate_dims: &CandidateDimsParams) -> Self {
        Self {
            x,
            candidate_dims: candidate_dims.clone(),
        }
    }

    pub fn x(&self) -> ArrayView2<'a, f64> {
        self.x
    }

    pub fn n_points(&self) -> usize {
        self.x.nrows()
    }

    /// `node_key` must be derived from the node's position only, so random
    /// dimension sampling is reproducible regardless of evaluation order.
    pub fn evaluate(
        &self,
        indices: &[usize],
        node_entropy: f64,
        node_key: u64,
    ) -> Result<EvaluatedSplit> {
        let subset = self.x.select(Axis(0), indices);
        let dims = candidate_dims(&self.candidate_dims, self.x.ncols(), node_key);
        let candidate = best_split(subset.view(), &dims)?;

        let (left_indices, right_indices) =
            split_indices(self.x, indices, candidate.dimension, candidate.threshold);
        let left = self.summarize(&left_indices)?;
        let right = self.summarize(&right_indices)?;

        let improvement = node_entropy
            - weighted_entropy(
                left.count,
                left.gaussian.entropy,
                right.count,
                right.gaussian.entropy,
            );
        trace!(
            "Best split of {} points: dim {} <= {:.6}, sides {}/{}, improvement {:.6}",
            indices.len(),
            candidate.dimension,
            candidate.threshold,
            left.count,
            right.count,
            improvement
        );

        Ok(EvaluatedSplit {
            split: NodeSplit {
                dimension: candidate.dimension,
                value: candidate.threshold,
                left,
                right,
            },
            improvement,
            left_indices,
            right_indices,
        })
    }

    fn summarize(&self, indices: &[usize]) -> Result<SideSummary> {
        let gaussian = Gaussian::fit(self.x.select(Axis(0), indices).view())?;
        Ok(SideSummary {
            count: indices.len(),
            fraction: indices.len() as f64 / self.n_points() as f64,
            gaussian,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::two_blobs;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_evaluate_fills_both_sides() {
        let x = two_blobs(30, [0.0, 0.0], [10.0, 0.0], 1.0, 5);
        let dims = CandidateDimsParams::All;
        let evaluator = SplitEvaluator::new(x.view(), &dims);

        // Only the second blob plus a few points of the first
        let indices: Vec<usize> = (25..60).collect();
        let node_entropy = Gaussian::fit(x.select(Axis(0), &indices).view())
            .unwrap()
            .entropy;
        let ev = evaluator.evaluate(&indices, node_entropy, 0).unwrap();

        assert_eq!(ev.split.dimension, 0);
        assert_eq!(ev.left_indices.len() + ev.right_indices.len(), indices.len());
        assert_eq!(ev.split.left.count, ev.left_indices.len());
        assert_abs_diff_eq!(
            ev.split.left.fraction + ev.split.right.fraction,
            indices.len() as f64 / 60.0,
            epsilon = 1e-12
        );
        assert!(ev.improvement > 0.0);
        assert!(ev.split.left.gaussian.peak_density > 0.0);
    }

    #[test]
    fn test_evaluator_outlives_candidate_params() {
        let x = two_blobs(30, [0.0, 0.0], [0.0, 10.0], 1.0, 8);
        let evaluator = {
            let dims = CandidateDimsParams::Random {
                max_dims: 1,
                seed: 3,
            };
            SplitEvaluator::new(x.view(), &dims)
        };
        let indices: Vec<usize> = (0..60).collect();
        let ev = evaluator.evaluate(&indices, f64::INFINITY, 1).unwrap();
        assert_eq!(ev.left_indices.len() + ev.right_indices.len(), 60);
    }

    #[test]
    fn test_outcome_merge() {
        let merged = GrowthOutcome::truncated()
            .merge(GrowthOutcome::cancelled())
            .merge(GrowthOutcome::truncated());
        assert!(merged.cancelled);
        assert_eq!(merged.truncated_branches, 2);
    }
}
