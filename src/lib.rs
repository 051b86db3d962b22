pub mod dataset;
pub mod error;
pub mod gaussian;
pub mod split;
pub mod test_data;
pub mod tree;

use ndarray::{Array1, ArrayView2};

pub use error::{DensityTreeError, Result};
pub use tree::{
    build_bounded, build_target_count, fit, fit_with_cancel, DensityTree, DensityTreeParams,
    DensityTreeParamsBuilder, GrowthStrategyParams, ImprovementThreshold,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Requested leaf count, for target-count growth.
    pub requested_leaves: Option<usize>,
    pub n_leaves: usize,
    pub n_nodes: usize,
    pub max_depth: usize,
    /// Target-count growth stopped before reaching the requested leaf count.
    pub under_target: bool,
    pub cancelled: bool,
    /// Branches that stopped growing because their subset could not be split.
    pub truncated_branches: usize,
}

pub trait DensityModel {
    fn density(&self, x: ArrayView2<f64>) -> Array1<f64>;
}
