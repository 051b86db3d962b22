use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};

use crate::error::Result;
use crate::gaussian::Gaussian;

use super::builder::{GrowthOutcome, SplitEvaluator};
use super::cancel::StopCondition;
use super::node::{DensityNode, NodeId, Region, Side};
use super::DensityTree;

/// An open side keyed by its cached entropy; ties go to the earlier side.
#[derive(Debug)]
struct OpenSide {
    entropy: f64,
    seq: usize,
    node: NodeId,
    side: Side,
}

impl Ord for OpenSide {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entropy
            .total_cmp(&other.entropy)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenSide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenSide {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenSide {}

fn push_open_sides(
    heap: &mut BinaryHeap<OpenSide>,
    tree: &DensityTree,
    node: NodeId,
    seq: &mut usize,
) {
    let Some(split) = tree.node(node).split() else {
        return;
    };
    for side in Side::BOTH {
        heap.push(OpenSide {
            entropy: split.side(side).gaussian.entropy,
            seq: *seq,
            node,
            side,
        });
        *seq += 1;
    }
}

/// Splits the root, then repeatedly the open side with the highest entropy,
/// until `n_leaves` regions exist or no open side can be split.
pub(crate) fn grow(
    evaluator: &SplitEvaluator<'_>,
    root_gaussian: Gaussian,
    n_leaves: usize,
    stop: &StopCondition,
) -> Result<(DensityTree, GrowthOutcome)> {
    let x = evaluator.x();
    let all: Vec<usize> = (0..x.nrows()).collect();
    let mut outcome = GrowthOutcome::default();

    let root_split = match evaluator.evaluate(&all, root_gaussian.entropy, 0) {
        Ok(evaluated) => Some(evaluated.split),
        Err(e) if e.is_local() => {
            warn!("Root cannot be split, tree is a single region: {e}");
            outcome.truncated_branches += 1;
            None
        }
        Err(e) => return Err(e),
    };
    let mut tree = DensityTree::new(
        DensityNode::root(x.nrows(), root_gaussian, root_split),
        x.nrows(),
        x.ncols(),
    );

    // The root split is unconditional, so even n_leaves = 1 yields two regions
    let target = n_leaves.max(2);
    let mut heap = BinaryHeap::new();
    let mut seq = 0;
    push_open_sides(&mut heap, &tree, tree.root(), &mut seq);

    let mut leaves = tree.n_leaves();
    while leaves < target {
        if stop.should_stop() {
            outcome.cancelled = true;
            break;
        }
        let Some(open) = heap.pop() else {
            break;
        };

        let region = Region {
            node: open.node,
            side: Some(open.side),
        };
        let indices = tree.region_indices(region, x);
        let node_key = tree.len() as u64;

        match evaluator.evaluate(&indices, open.entropy, node_key) {
            Ok(evaluated) => {
                let child = {
                    let parent = tree.node(open.node);
                    let Some(summary) = parent.split().map(|s| s.side(open.side)) else {
                        continue;
                    };
                    DensityNode::child(
                        open.node,
                        open.side,
                        parent.depth() + 1,
                        summary,
                        Some(evaluated.split),
                    )
                };
                let id = tree.attach(open.node, open.side, child);
                debug!(
                    "Split {:?} side of node {} (entropy {:.4}) into node {}",
                    open.side, open.node, open.entropy, id
                );
                push_open_sides(&mut heap, &tree, id, &mut seq);
                leaves += 1;
            }
            Err(e) if e.is_local() => {
                debug!(
                    "{:?} side of node {} stays a leaf: {e}",
                    open.side, open.node
                );
                outcome.truncated_branches += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if leaves < target {
        warn!("Density tree has {leaves} leaves, {target} requested");
    }
    Ok((tree, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(entropy: f64, seq: usize) -> OpenSide {
        OpenSide {
            entropy,
            seq,
            node: 0,
            side: Side::Left,
        }
    }

    #[test]
    fn test_heap_pops_highest_entropy_then_earliest() {
        let mut heap = BinaryHeap::new();
        heap.push(open(-1.0, 0));
        heap.push(open(2.0, 1));
        heap.push(open(2.0, 2));
        heap.push(open(0.5, 3));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|o| o.seq)).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }
}
