use ndarray::{Array2, ArrayView2, Axis};

use crate::error::Result;
use crate::gaussian;

#[derive(Debug, Clone)]
pub struct Partition {
    pub left: Array2<f64>,
    pub right: Array2<f64>,
    /// `(left, right)` Gaussian entropies, when requested.
    pub entropy: Option<(f64, f64)>,
}

/// The one boundary rule of the crate: values equal to the threshold go left.
#[inline]
pub fn goes_left(value: f64, threshold: f64) -> bool {
    value <= threshold
}

/// Local row positions of each side, in their original relative order.
pub fn split_rows(
    subset: ArrayView2<f64>,
    dimension: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let column = subset.column(dimension);
    (0..subset.nrows()).partition(|&i| goes_left(column[i], threshold))
}

/// Same as `split_rows`, for a subset given as row indices into the full dataset.
pub fn split_indices(
    x: ArrayView2<f64>,
    indices: &[usize],
    dimension: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    indices
        .iter()
        .copied()
        .partition(|&i| goes_left(x[[i, dimension]], threshold))
}

pub fn partition(
    subset: ArrayView2<f64>,
    dimension: usize,
    threshold: f64,
    compute_entropy: bool,
) -> Result<Partition> {
    let (left_rows, right_rows) = split_rows(subset, dimension, threshold);
    let left = subset.select(Axis(0), &left_rows);
    let right = subset.select(Axis(0), &right_rows);

    let entropy = if compute_entropy {
        Some((
            gaussian::entropy(left.view())?,
            gaussian::entropy(right.view())?,
        ))
    } else {
        None
    };

    Ok(Partition {
        left,
        right,
        entropy,
    })
}
