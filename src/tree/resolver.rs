use ndarray::{Array2, ArrayView2, Axis};

use super::node::{NodeId, Region, Side};
use super::DensityTree;

/// One split constraint on the way from the root: `(dimension, value, side)`.
pub type PathConstraint = (usize, f64, Side);

impl DensityTree {
    /// Split constraints from the root down to `node`, in root-to-node order.
    pub fn path_constraints(&self, node: NodeId) -> Vec<PathConstraint> {
        let mut constraints = Vec::with_capacity(self.node(node).depth());
        let mut current = node;
        while let Some(parent) = self.node(current).parent() {
            let side = self.node(current).side();
            if let (Some(side), Some(split)) = (side, self.node(parent).split()) {
                constraints.push((split.dimension, split.value, side));
            }
            current = parent;
        }
        constraints.reverse();
        constraints
    }

    /// Row indices of `x` that fall in `node`'s region. Nothing is cached on
    /// the nodes; the subset is recomputed from the ancestor chain every time.
    pub fn indices_for(&self, node: NodeId, x: ArrayView2<f64>) -> Vec<usize> {
        filter_rows(x, &self.path_constraints(node))
    }

    pub fn dataset_for(&self, node: NodeId, x: ArrayView2<f64>) -> Array2<f64> {
        if self.node(node).is_root() {
            return x.to_owned();
        }
        x.select(Axis(0), &self.indices_for(node, x))
    }

    pub fn region_indices(&self, region: Region, x: ArrayView2<f64>) -> Vec<usize> {
        let mut constraints = self.path_constraints(region.node);
        if let (Some(side), Some(split)) = (region.side, self.node(region.node).split()) {
            constraints.push((split.dimension, split.value, side));
        }
        filter_rows(x, &constraints)
    }

    pub fn region_dataset(&self, region: Region, x: ArrayView2<f64>) -> Array2<f64> {
        x.select(Axis(0), &self.region_indices(region, x))
    }
}

fn filter_rows(x: ArrayView2<f64>, constraints: &[PathConstraint]) -> Vec<usize> {
    (0..x.nrows())
        .filter(|&i| {
            constraints
                .iter()
                .all(|&(dim, value, side)| side.contains(x[[i, dim]], value))
        })
        .collect()
}
