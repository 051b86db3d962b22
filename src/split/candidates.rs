use itertools::Itertools;
use ndarray::ArrayView1;
use rand::{rngs::StdRng, seq::index::sample, SeedableRng};

use super::params::CandidateDimsParams;

pub fn candidate_dims(params: &CandidateDimsParams, n_dims: usize, node_key: u64) -> Vec<usize> {
    match *params {
        CandidateDimsParams::All => (0..n_dims).collect(),
        CandidateDimsParams::Random { max_dims, seed } => {
            if max_dims >= n_dims {
                return (0..n_dims).collect();
            }
            let mut rng = StdRng::seed_from_u64(node_seed(seed, node_key));
            let mut dims = sample(&mut rng, n_dims, max_dims).into_vec();
            // Enumeration order must not depend on sampling order
            dims.sort_unstable();
            dims
        }
    }
}

pub fn node_seed(seed: u64, node_key: u64) -> u64 {
    seed ^ node_key.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Row positions sorted by value; equal values keep their original order.
pub fn sorted_order(column: ArrayView1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..column.len()).collect();
    order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
    order
}

/// `(left_count, threshold)` for every distinct observed value but the largest,
/// in ascending threshold order.
pub fn threshold_positions(column: ArrayView1<f64>, order: &[usize]) -> Vec<(usize, f64)> {
    order
        .iter()
        .enumerate()
        .tuple_windows()
        .filter(|&((_, &a), (_, &b))| column[a] < column[b])
        .map(|((i, &a), _)| (i + 1, column[a]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_threshold_positions_skip_duplicates_and_max() {
        let column = array![3.0, 1.0, 2.0, 1.0, 3.0, 5.0];
        let order = sorted_order(column.view());
        assert_eq!(order, vec![1, 3, 2, 0, 4, 5]);
        assert_eq!(
            threshold_positions(column.view(), &order),
            vec![(2, 1.0), (3, 2.0), (5, 3.0)]
        );
    }

    #[test]
    fn test_constant_column_has_no_thresholds() {
        let column = array![2.0, 2.0, 2.0];
        let order = sorted_order(column.view());
        assert!(threshold_positions(column.view(), &order).is_empty());
    }

    #[test]
    fn test_candidate_dims_all() {
        assert_eq!(
            candidate_dims(&CandidateDimsParams::All, 4, 7),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_candidate_dims_random_is_reproducible() {
        let params = CandidateDimsParams::Random {
            max_dims: 3,
            seed: 42,
        };
        let first = candidate_dims(&params, 10, 5);
        let second = candidate_dims(&params, 10, 5);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|&d| d < 10));
    }

    #[test]
    fn test_candidate_dims_random_caps_at_n_dims() {
        let params = CandidateDimsParams::Random {
            max_dims: 8,
            seed: 1,
        };
        assert_eq!(candidate_dims(&params, 3, 0), vec![0, 1, 2]);
    }
}
