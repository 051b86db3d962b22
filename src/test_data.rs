use std::f64::consts::PI;

use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Standard normal draw via the Box-Muller transform.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Isotropic Gaussian blobs, `n_per_blob` rows per center, blobs stacked in order.
/// The dimension is taken from the first center.
pub fn blobs(centers: &[Vec<f64>], n_per_blob: usize, sd: f64, seed: u64) -> Array2<f64> {
    let dims = centers.first().map_or(0, |c| c.len());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut x = Array2::zeros((centers.len() * n_per_blob, dims));
    let mut rows = x.axis_iter_mut(Axis(0));
    for center in centers {
        for row in rows.by_ref().take(n_per_blob) {
            for (v, &mu) in row.into_iter().zip(center) {
                *v = mu + sd * standard_normal(&mut rng);
            }
        }
    }
    x
}

pub fn two_blobs(n_per_blob: usize, a: [f64; 2], b: [f64; 2], sd: f64, seed: u64) -> Array2<f64> {
    blobs(&[a.to_vec(), b.to_vec()], n_per_blob, sd, seed)
}

pub fn four_blobs(n_per_blob: usize, seed: u64) -> Array2<f64> {
    blobs(
        &[
            vec![0.0, 0.0],
            vec![25.0, 0.0],
            vec![0.0, 25.0],
            vec![25.0, 25.0],
        ],
        n_per_blob,
        1.0,
        seed,
    )
}
