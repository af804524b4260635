//! K-means clustering (Lloyd's algorithm, Euclidean distance)
//!
//! Initial centroids are drawn at random from the input with k-means++
//! weighting (probability proportional to squared distance from the centroids
//! already chosen), so coincident points never seed two clusters. The loop
//! stops when no assignment changes or after `max_iterations`.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ClusterPoint;

pub const DEFAULT_MAX_ITERATIONS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Fixed seed for reproducible centroid selection; `None` draws from entropy
    pub seed: Option<u64>,
}

impl KMeansConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansResult {
    /// Input points with `cluster` filled in
    pub points: Vec<ClusterPoint>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
}

impl KMeansResult {
    /// Ids of the points assigned to `cluster`
    pub fn members(&self, cluster: usize) -> Vec<&str> {
        self.points
            .iter()
            .filter(|p| p.cluster == Some(cluster))
            .map(|p| p.id.as_str())
            .collect()
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn nearest(centroids: &[Vec<f64>], features: &[f64]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, euclidean_distance(c, features)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Pick `k` initial centroids (k <= points.len())
fn seed_centroids(points: &[ClusterPoint], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut chosen = vec![rng.gen_range(0..points.len())];

    while chosen.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                chosen
                    .iter()
                    .map(|&c| euclidean_distance(&points[c].features, &p.features).powi(2))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let next = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            // Every remaining point coincides with a chosen one
            Err(_) => (0..points.len())
                .find(|i| !chosen.contains(i))
                .unwrap_or(0),
        };
        chosen.push(next);
    }

    chosen.into_iter().map(|i| points[i].features.clone()).collect()
}

/// Cluster points into at most `config.k` groups
///
/// `k` is reduced to the number of points when fewer are given. All feature
/// vectors must share one dimension.
pub fn kmeans(points: &[ClusterPoint], config: &KMeansConfig) -> Result<KMeansResult> {
    if config.k == 0 {
        return Err(Error::InvalidData("k-means needs k >= 1".into()));
    }
    if points.is_empty() {
        return Ok(KMeansResult {
            points: Vec::new(),
            centroids: Vec::new(),
            iterations: 0,
            converged: true,
        });
    }

    let dim = points[0].features.len();
    if let Some(bad) = points.iter().find(|p| p.features.len() != dim) {
        return Err(Error::InvalidData(format!(
            "Point {} has {} features, expected {}",
            bad.id,
            bad.features.len(),
            dim
        )));
    }

    let k = config.k.min(points.len());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut centroids = seed_centroids(points, k, &mut rng);

    let mut assignments: Vec<Option<usize>> = vec![None; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut changed = false;
        for (slot, point) in assignments.iter_mut().zip(points) {
            let cluster = nearest(&centroids, &point.features);
            if *slot != Some(cluster) {
                *slot = Some(cluster);
                changed = true;
            }
        }

        if !changed {
            converged = true;
            break;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (slot, point) in assignments.iter().zip(points) {
            if let Some(c) = slot {
                counts[*c] += 1;
                for (s, f) in sums[*c].iter_mut().zip(&point.features) {
                    *s += f;
                }
            }
        }

        // An empty cluster keeps its previous centroid
        for (c, centroid) in centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                *centroid = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            }
        }
    }

    tracing::debug!(k, iterations, converged, "k-means finished");

    let points = points
        .iter()
        .zip(&assignments)
        .map(|(p, slot)| ClusterPoint {
            cluster: *slot,
            ..p.clone()
        })
        .collect();

    Ok(KMeansResult {
        points,
        centroids,
        iterations,
        converged,
    })
}
