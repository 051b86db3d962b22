use ndarray::Array1;

use crate::gaussian::Gaussian;
use crate::split::partition::goes_left;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Whether a point with `value` on the split dimension falls on this side.
    #[inline]
    pub fn contains(self, value: f64, threshold: f64) -> bool {
        match self {
            Side::Left => goes_left(value, threshold),
            Side::Right => !goes_left(value, threshold),
        }
    }
}

/// Cached statistics for one prospective child of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSummary {
    pub count: usize,
    /// Share of the whole dataset, not of the parent's subset.
    pub fraction: f64,
    pub gaussian: Gaussian,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSplit {
    pub dimension: usize,
    pub value: f64,
    pub left: SideSummary,
    pub right: SideSummary,
}

impl NodeSplit {
    pub fn side(&self, side: Side) -> &SideSummary {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_of(&self, value: f64) -> Side {
        if Side::Left.contains(value, self.value) {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// A node of the density tree.
///
/// Nodes are only created by the builders. After creation the only fields that
/// change are the two child links, each set at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityNode {
    pub(crate) parent: Option<NodeId>,
    /// Which side of `parent` this node descends from.
    pub(crate) side: Option<Side>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) count: usize,
    pub(crate) gaussian: Gaussian,
    pub(crate) split: Option<NodeSplit>,
}

impl DensityNode {
    pub(crate) fn root(count: usize, gaussian: Gaussian, split: Option<NodeSplit>) -> Self {
        Self {
            parent: None,
            side: None,
            left: None,
            right: None,
            depth: 0,
            count,
            gaussian,
            split,
        }
    }

    pub(crate) fn child(
        parent: NodeId,
        side: Side,
        depth: usize,
        summary: &SideSummary,
        split: Option<NodeSplit>,
    ) -> Self {
        Self {
            parent: Some(parent),
            side: Some(side),
            left: None,
            right: None,
            depth,
            count: summary.count,
            gaussian: summary.gaussian.clone(),
            split,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn child_on(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of dataset points in this node's region.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn gaussian(&self) -> &Gaussian {
        &self.gaussian
    }

    pub fn split(&self) -> Option<&NodeSplit> {
        self.split.as_ref()
    }

    pub fn entropy(&self) -> f64 {
        self.gaussian.entropy
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.gaussian.mean
    }

    pub fn peak_density(&self) -> f64 {
        self.gaussian.peak_density
    }

    pub fn split_dimension(&self) -> Option<usize> {
        self.split.as_ref().map(|s| s.dimension)
    }

    pub fn split_value(&self) -> Option<f64> {
        self.split.as_ref().map(|s| s.value)
    }

    pub fn left_fraction(&self) -> Option<f64> {
        self.split.as_ref().map(|s| s.left.fraction)
    }

    pub fn right_fraction(&self) -> Option<f64> {
        self.split.as_ref().map(|s| s.right.fraction)
    }

    /// Sides with cached statistics but no materialized child.
    pub fn open_sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::BOTH
            .into_iter()
            .filter(move |&side| self.split.is_some() && self.child_on(side).is_none())
    }
}

/// A leaf region: either an open side of a split node, or an unsplit childless node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub node: NodeId,
    pub side: Option<Side>,
}
