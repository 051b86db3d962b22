use log::{info, warn};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::dataset::{constant_column, validate_dataset};
use crate::error::{DensityTreeError, Result};
use crate::gaussian::Gaussian;
use crate::{BuildReport, DensityModel};

mod bounded;
mod builder;
pub mod cancel;
pub mod node;
pub mod params;
pub mod resolver;
mod target_count;

use builder::SplitEvaluator;
use cancel::{CancelFlag, StopCondition};
pub use node::{DensityNode, NodeId, NodeSplit, Region, Side, SideSummary};
pub use params::{
    DensityTreeParams, DensityTreeParamsBuilder, GrowthStrategyParams, ImprovementThreshold,
};


/// Binary tree of axis-aligned regions, each carrying a Gaussian fit.
///
/// Nodes live in an arena indexed by `NodeId`; the root is always `0` and
/// parent links are plain indices back into the arena.
#[derive(Debug, Clone)]
pub struct DensityTree {
    nodes: Vec<DensityNode>,
    n_points: usize,
    n_dims: usize,
}

impl DensityTree {
    pub(crate) fn new(root: DensityNode, n_points: usize, n_dims: usize) -> Self {
        Self {
            nodes: vec![root],
            n_points,
            n_dims,
        }
    }

    /// Materializes `node` as the `side` child of `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, side: Side, node: DensityNode) -> NodeId {
        let id = self.nodes.len();
        let slot = match side {
            Side::Left => &mut self.nodes[parent].left,
            Side::Right => &mut self.nodes[parent].right,
        };
        debug_assert!(slot.is_none(), "child link of node {parent} set twice");
        *slot = Some(id);
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &DensityNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[DensityNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Size of the dataset the tree was built on.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        (self.nodes[id].left, self.nodes[id].right)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.nodes[id].depth
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Follows parent links until a node without parent is reached.
    pub fn find_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current
    }

    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            let (left, right) = self.children(id);
            stack.extend(right);
            stack.extend(left);
        }
        order
    }

    /// Leaf regions in preorder.
    pub fn leaves(&self) -> Vec<Region> {
        let mut regions = Vec::new();
        for id in self.preorder() {
            let node = &self.nodes[id];
            if node.split.is_some() {
                regions.extend(node.open_sides().map(|side| Region {
                    node: id,
                    side: Some(side),
                }));
            } else if node.is_leaf() {
                regions.push(Region { node: id, side: None });
            }
        }
        regions
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves().len()
    }

    /// The open side with the largest cached entropy; ties go to the node
    /// created first, and to the left side within one node.
    pub fn highest_entropy_open_side(&self) -> Option<(Region, f64)> {
        let mut best: Option<(Region, f64)> = None;
        for (id, node) in self.nodes.iter().enumerate() {
            let Some(split) = node.split() else {
                continue;
            };
            for side in node.open_sides() {
                let entropy = split.side(side).gaussian.entropy;
                if best.map_or(true, |(_, e)| entropy > e) {
                    best = Some((
                        Region {
                            node: id,
                            side: Some(side),
                        },
                        entropy,
                    ));
                }
            }
        }
        best
    }

    pub fn region_gaussian(&self, region: Region) -> &Gaussian {
        let node = &self.nodes[region.node];
        match (region.side, node.split()) {
            (Some(side), Some(split)) => &split.side(side).gaussian,
            _ => &node.gaussian,
        }
    }

    pub fn region_count(&self, region: Region) -> usize {
        let node = &self.nodes[region.node];
        match (region.side, node.split()) {
            (Some(side), Some(split)) => split.side(side).count,
            _ => node.count,
        }
    }

    /// Share of the whole dataset inside `region`.
    pub fn region_fraction(&self, region: Region) -> f64 {
        self.region_count(region) as f64 / self.n_points as f64
    }

    /// Descends by the split predicates to the leaf region containing `x`.
    pub fn leaf_for_point(&self, x: ArrayView1<f64>) -> Region {
        let mut current = self.root();
        loop {
            let node = &self.nodes[current];
            let Some(split) = node.split() else {
                return Region {
                    node: current,
                    side: None,
                };
            };
            let side = split.side_of(x[split.dimension]);
            match node.child_on(side) {
                Some(child) => current = child,
                None => {
                    return Region {
                        node: current,
                        side: Some(side),
                    }
                }
            }
        }
    }

    /// Piecewise density: the Gaussian of the region containing `x`, weighted
    /// by that region's share of the data.
    pub fn log_density_at(&self, x: ArrayView1<f64>) -> f64 {
        let region = self.leaf_for_point(x);
        self.region_fraction(region).ln() + self.region_gaussian(region).log_density(x)
    }

    pub fn density_at(&self, x: ArrayView1<f64>) -> f64 {
        self.log_density_at(x).exp()
    }
}

impl DensityModel for DensityTree {
    fn density(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| self.density_at(row))
            .collect()
    }
}

pub fn fit(x: ArrayView2<f64>, params: &DensityTreeParams) -> Result<(BuildReport, DensityTree)> {
    fit_inner(x, params, None)
}

/// Like `fit`, stopping early with a partial tree once `cancel` is raised.
pub fn fit_with_cancel(
    x: ArrayView2<f64>,
    params: &DensityTreeParams,
    cancel: &CancelFlag,
) -> Result<(BuildReport, DensityTree)> {
    fit_inner(x, params, Some(cancel.clone()))
}

pub fn build_target_count(
    x: ArrayView2<f64>,
    n_leaves: usize,
) -> Result<(BuildReport, DensityTree)> {
    let params = DensityTreeParamsBuilder::new().n_leaves(n_leaves).build();
    fit(x, &params)
}

pub fn build_bounded(
    x: ArrayView2<f64>,
    max_depth: usize,
    min_subset_fraction: f64,
    improvement_threshold: ImprovementThreshold,
) -> Result<(BuildReport, DensityTree)> {
    let params = DensityTreeParamsBuilder::new()
        .bounded(max_depth, min_subset_fraction, improvement_threshold)
        .build();
    fit(x, &params)
}

fn fit_inner(
    x: ArrayView2<f64>,
    params: &DensityTreeParams,
    cancel: Option<CancelFlag>,
) -> Result<(BuildReport, DensityTree)> {
    validate_dataset(x)?;
    params.validate()?;

    info!(
        "Building density tree on {} points in {} dimensions with {:?}",
        x.nrows(),
        x.ncols(),
        params.strategy
    );

    let stop = StopCondition::new(cancel, params.time_budget);
    let evaluator = SplitEvaluator::new(x, &params.candidate_dims);
    let root_gaussian = Gaussian::fit(x).map_err(|e| match (e, constant_column(x)) {
        (DensityTreeError::DegenerateCovariance, Some(col)) => {
            DensityTreeError::ConstantColumn { col }
        }
        (e, _) => e,
    })?;

    let (requested_leaves, (tree, outcome)) = match params.strategy {
        GrowthStrategyParams::TargetLeaves { n_leaves } => (
            Some(n_leaves),
            target_count::grow(&evaluator, root_gaussian, n_leaves, &stop)?,
        ),
        GrowthStrategyParams::Bounded {
            max_depth,
            min_subset_fraction,
            improvement_threshold,
        } => (
            None,
            bounded::grow(
                &evaluator,
                root_gaussian,
                max_depth,
                min_subset_fraction,
                improvement_threshold,
                &stop,
            )?,
        ),
    };

    let n_leaves = tree.n_leaves();
    let report = BuildReport {
        requested_leaves,
        n_leaves,
        n_nodes: tree.len(),
        max_depth: tree.max_depth(),
        under_target: requested_leaves.is_some_and(|k| n_leaves < k.max(2)),
        cancelled: outcome.cancelled,
        truncated_branches: outcome.truncated_branches,
    };

    if report.cancelled {
        warn!("Density tree build stopped early, returning partial tree");
    }
    info!(
        "Density tree built: {} nodes, {} leaves, depth {}",
        report.n_nodes, report.n_leaves, report.max_depth
    );

    Ok((report, tree))
}
