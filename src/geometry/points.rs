use std::fmt;

use fortune_voronoi::BoundingBox;
use glam::DVec2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Shape of a generated site set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PointDistribution {
    /// Independent uniform samples.
    Uniform,
    /// One sample per grid cell, jittered within the cell.
    #[value(name = "jittered-grid")]
    JitteredGrid,
    /// Gaussian blobs around a few uniform centers.
    Clustered,
}

impl fmt::Display for PointDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointDistribution::Uniform => write!(f, "uniform"),
            PointDistribution::JitteredGrid => write!(f, "jittered-grid"),
            PointDistribution::Clustered => write!(f, "clustered"),
        }
    }
}

/// Average distance between neighbours for `n` evenly spread points.
pub fn mean_spacing(n: usize, bounds: &BoundingBox) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (bounds.area() / n as f64).sqrt()
}

/// Generate `n` uniformly distributed points inside `bounds`.
pub fn uniform_points_with_rng<R: Rng>(n: usize, bounds: &BoundingBox, rng: &mut R) -> Vec<DVec2> {
    (0..n)
        .map(|_| {
            DVec2::new(
                rng.gen_range(bounds.min.x..bounds.max.x),
                rng.gen_range(bounds.min.y..bounds.max.y),
            )
        })
        .collect()
}

/// Generate `n` points on a grid covering `bounds`, each moved by up to
/// `jitter` grid spacings (0 gives the bare grid centers).
pub fn jittered_grid_points_with_rng<R: Rng>(
    n: usize,
    bounds: &BoundingBox,
    jitter: f64,
    rng: &mut R,
) -> Vec<DVec2> {
    if n == 0 {
        return Vec::new();
    }
    let aspect = bounds.width() / bounds.height();
    let cols = ((n as f64 * aspect).sqrt().ceil() as usize).max(1);
    let rows = n.div_ceil(cols);
    let step = DVec2::new(bounds.width() / cols as f64, bounds.height() / rows as f64);
    let half = 0.5 * jitter.clamp(0.0, 1.0);

    (0..n)
        .map(|i| {
            let cell = DVec2::new((i % cols) as f64, (i / cols) as f64);
            let mut offset = DVec2::splat(0.5);
            if half > 0.0 {
                offset += DVec2::new(rng.gen_range(-half..half), rng.gen_range(-half..half));
            }
            bounds.min + (cell + offset) * step
        })
        .collect()
}

/// Generate `n` points in `num_clusters` Gaussian blobs. `spread` is the
/// standard deviation as a fraction of the shorter side. Samples are clamped
/// into `bounds`.
pub fn clustered_points_with_rng<R: Rng>(
    n: usize,
    bounds: &BoundingBox,
    num_clusters: usize,
    spread: f64,
    rng: &mut R,
) -> Vec<DVec2> {
    let centers = uniform_points_with_rng(num_clusters.max(1), bounds, rng);
    let sigma = spread * bounds.width().min(bounds.height());
    let Ok(normal) = Normal::new(0.0, sigma) else {
        log::warn!("invalid cluster spread {}, falling back to uniform points", spread);
        return uniform_points_with_rng(n, bounds, rng);
    };

    (0..n)
        .map(|_| {
            let c = centers[rng.gen_range(0..centers.len())];
            let p = c + DVec2::new(normal.sample(rng), normal.sample(rng));
            p.clamp(bounds.min, bounds.max)
        })
        .collect()
}

/// Deterministic point set for a seed.
pub fn generate_points(n: usize, distribution: PointDistribution, bounds: &BoundingBox, seed: u64) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match distribution {
        PointDistribution::Uniform => uniform_points_with_rng(n, bounds, &mut rng),
        PointDistribution::JitteredGrid => jittered_grid_points_with_rng(n, bounds, 0.5, &mut rng),
        PointDistribution::Clustered => {
            let clusters = ((n as f64).sqrt() as usize / 4).clamp(1, 64);
            clustered_points_with_rng(n, bounds, clusters, 0.05, &mut rng)
        }
    }
}
