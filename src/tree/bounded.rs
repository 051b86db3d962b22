use log::debug;

use crate::error::Result;
use crate::gaussian::Gaussian;

use super::builder::{EvaluatedSplit, GrowthOutcome, SplitEvaluator};
use super::cancel::StopCondition;
use super::node::{DensityNode, NodeId, NodeSplit, Side, SideSummary};
use super::params::ImprovementThreshold;
use super::DensityTree;

#[cfg(feature = "use-rayon")]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "use-rayon"))]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}

/// Owned subtree built independently of the arena, then grafted in preorder.
#[derive(Debug)]
struct Subtree {
    count: usize,
    gaussian: Gaussian,
    split: Option<NodeSplit>,
    children: Option<Box<(Subtree, Subtree)>>,
}

impl Subtree {
    fn leaf(count: usize, gaussian: Gaussian) -> Self {
        Self {
            count,
            gaussian,
            split: None,
            children: None,
        }
    }
}

#[derive(Debug)]
struct BoundedGrower<'a, 'x> {
    evaluator: &'a SplitEvaluator<'x>,
    max_depth: usize,
    min_count: f64,
    improvement_threshold: ImprovementThreshold,
    stop: &'a StopCondition,
}

impl BoundedGrower<'_, '_> {
    fn grow(
        &self,
        indices: Vec<usize>,
        gaussian: Gaussian,
        depth: usize,
        key: u64,
    ) -> Result<(Subtree, GrowthOutcome)> {
        let count = indices.len();
        if self.stop.should_stop() {
            return Ok((Subtree::leaf(count, gaussian), GrowthOutcome::cancelled()));
        }

        let evaluated = match self.evaluator.evaluate(&indices, gaussian.entropy, key) {
            Ok(evaluated) => evaluated,
            Err(e) if e.is_local() => {
                debug!("Node of {count} points at depth {depth} stays a leaf: {e}");
                return Ok((Subtree::leaf(count, gaussian), GrowthOutcome::truncated()));
            }
            Err(e) => return Err(e),
        };

        if !self.improvement_threshold.accepts(evaluated.improvement) {
            debug!(
                "Rejected split at depth {depth}: improvement {:.4}",
                evaluated.improvement
            );
            return Ok((Subtree::leaf(count, gaussian), GrowthOutcome::default()));
        }

        let EvaluatedSplit {
            split,
            left_indices,
            right_indices,
            ..
        } = evaluated;
        let child_key = key.wrapping_mul(2);

        let (left, right) = join(
            || self.grow_side(left_indices, &split.left, depth + 1, child_key),
            || self.grow_side(right_indices, &split.right, depth + 1, child_key.wrapping_add(1)),
        );
        let (left, left_outcome) = left?;
        let (right, right_outcome) = right?;

        Ok((
            Subtree {
                count,
                gaussian,
                split: Some(split),
                children: Some(Box::new((left, right))),
            },
            left_outcome.merge(right_outcome),
        ))
    }

    fn grow_side(
        &self,
        indices: Vec<usize>,
        summary: &SideSummary,
        depth: usize,
        key: u64,
    ) -> Result<(Subtree, GrowthOutcome)> {
        if depth < self.max_depth && summary.count as f64 > self.min_count {
            self.grow(indices, summary.gaussian.clone(), depth, key)
        } else {
            Ok((
                Subtree::leaf(summary.count, summary.gaussian.clone()),
                GrowthOutcome::default(),
            ))
        }
    }
}

fn graft(tree: &mut DensityTree, parent: NodeId, side: Side, depth: usize, subtree: Subtree) {
    let Subtree {
        count,
        gaussian,
        split,
        children,
    } = subtree;
    let node = DensityNode {
        parent: Some(parent),
        side: Some(side),
        left: None,
        right: None,
        depth,
        count,
        gaussian,
        split,
    };
    let id = tree.attach(parent, side, node);
    if let Some(children) = children {
        let (left, right) = *children;
        graft(tree, id, Side::Left, depth + 1, left);
        graft(tree, id, Side::Right, depth + 1, right);
    }
}

/// Splits every accepted node's children recursively, until `max_depth`,
/// the subset size floor, or the improvement gate stops a branch.
pub(crate) fn grow(
    evaluator: &SplitEvaluator<'_>,
    root_gaussian: Gaussian,
    max_depth: usize,
    min_subset_fraction: f64,
    improvement_threshold: ImprovementThreshold,
    stop: &StopCondition,
) -> Result<(DensityTree, GrowthOutcome)> {
    let x = evaluator.x();
    let grower = BoundedGrower {
        evaluator,
        max_depth,
        min_count: min_subset_fraction * x.nrows() as f64,
        improvement_threshold,
        stop,
    };

    let all: Vec<usize> = (0..x.nrows()).collect();
    let (root, outcome) = grower.grow(all, root_gaussian, 0, 1)?;

    let Subtree {
        count,
        gaussian,
        split,
        children,
    } = root;
    let mut tree = DensityTree::new(
        DensityNode::root(count, gaussian, split),
        x.nrows(),
        x.ncols(),
    );
    if let Some(children) = children {
        let (left, right) = *children;
        let root = tree.root();
        graft(&mut tree, root, Side::Left, 1, left);
        graft(&mut tree, root, Side::Right, 1, right);
    }

    Ok((tree, outcome))
}
