use std::str::FromStr;
use std::time::Duration;

use crate::error::{DensityTreeError, Result};
use crate::split::CandidateDimsParams;

/// Gate on the entropy reduction a split must achieve to be accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImprovementThreshold {
    Always,
    Above(f64),
}

impl ImprovementThreshold {
    pub fn accepts(&self, improvement: f64) -> bool {
        match *self {
            ImprovementThreshold::Always => true,
            ImprovementThreshold::Above(threshold) => improvement > threshold,
        }
    }
}

impl FromStr for ImprovementThreshold {
    type Err = DensityTreeError;

    /// Accepts `always` or a number of nats.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("always") {
            return Ok(ImprovementThreshold::Always);
        }
        s.trim()
            .parse::<f64>()
            .map(ImprovementThreshold::Above)
            .map_err(|_| {
                DensityTreeError::InvalidParameter(format!(
                    "improvement threshold must be `always` or a number, got {s:?}"
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrowthStrategyParams {
    /// Split the open side with the highest entropy until `n_leaves` regions exist.
    TargetLeaves { n_leaves: usize },
    /// Split both children recursively, bounded by depth, subset size and gain.
    Bounded {
        max_depth: usize,
        min_subset_fraction: f64,
        improvement_threshold: ImprovementThreshold,
    },
}

#[derive(Debug, Clone)]
pub struct DensityTreeParams {
    pub strategy: GrowthStrategyParams,
    pub candidate_dims: CandidateDimsParams,
    pub time_budget: Option<Duration>,
}

impl DensityTreeParams {
    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            GrowthStrategyParams::TargetLeaves { n_leaves } => {
                if n_leaves == 0 {
                    return Err(DensityTreeError::InvalidParameter(
                        "n_leaves must be at least 1".to_string(),
                    ));
                }
            }
            GrowthStrategyParams::Bounded {
                max_depth,
                min_subset_fraction,
                improvement_threshold,
            } => {
                if max_depth == 0 {
                    return Err(DensityTreeError::InvalidParameter(
                        "max_depth must be at least 1".to_string(),
                    ));
                }
                if !(0.0..1.0).contains(&min_subset_fraction) {
                    return Err(DensityTreeError::InvalidParameter(format!(
                        "min_subset_fraction must lie in [0, 1), got {min_subset_fraction}"
                    )));
                }
                if let ImprovementThreshold::Above(t) = improvement_threshold {
                    if !t.is_finite() {
                        return Err(DensityTreeError::InvalidParameter(format!(
                            "improvement_threshold must be finite, got {t}"
                        )));
                    }
                }
            }
        }

        if let CandidateDimsParams::Random { max_dims: 0, .. } = self.candidate_dims {
            return Err(DensityTreeError::InvalidParameter(
                "max_dims must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// Builder for DensityTreeParams
#[derive(Debug, Clone)]
pub struct DensityTreeParamsBuilder {
    strategy: GrowthStrategyParams,
    candidate_dims: CandidateDimsParams,
    time_budget: Option<Duration>,
}

impl DensityTreeParamsBuilder {
    pub fn new() -> Self {
        Self {
            strategy: GrowthStrategyParams::Bounded {
                max_depth: 4,
                min_subset_fraction: 0.05,
                improvement_threshold: ImprovementThreshold::Always,
            },
            candidate_dims: CandidateDimsParams::All,
            time_budget: None,
        }
    }

    pub fn n_leaves(mut self, n_leaves: usize) -> Self {
        self.strategy = GrowthStrategyParams::TargetLeaves { n_leaves };
        self
    }

    pub fn bounded(
        mut self,
        max_depth: usize,
        min_subset_fraction: f64,
        improvement_threshold: ImprovementThreshold,
    ) -> Self {
        self.strategy = GrowthStrategyParams::Bounded {
            max_depth,
            min_subset_fraction,
            improvement_threshold,
        };
        self
    }

    pub fn strategy(mut self, strategy: GrowthStrategyParams) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_dims(mut self, max_dims: usize, seed: u64) -> Self {
        self.candidate_dims = CandidateDimsParams::Random { max_dims, seed };
        self
    }

    pub fn candidate_dims(mut self, candidate_dims: CandidateDimsParams) -> Self {
        self.candidate_dims = candidate_dims;
        self
    }

    pub fn time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = Some(time_budget);
        self
    }

    pub fn build(self) -> DensityTreeParams {
        DensityTreeParams {
            strategy: self.strategy,
            candidate_dims: self.candidate_dims,
            time_budget: self.time_budget,
        }
    }
}

impl Default for DensityTreeParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DensityTreeParams {
    fn default() -> Self {
        DensityTreeParamsBuilder::new().build()
    }
}
