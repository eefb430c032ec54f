//! Clustering of finished word vectors.
//!
//! The indexing pipeline only needs a black box that turns a set of equal
//! length vectors into `k` centroids; [`Clusterer`] is that seam and
//! [`KMeans`] the bundled implementation.
//!
//! Invalid inputs fail fast: an empty set, `k == 0`, `k` larger than the
//! number of vectors, or vectors of differing dimension.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rindex_types::Distance;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("no vectors to cluster")]
    EmptyInput,
    #[error("k must be > 0")]
    ZeroClusters,
    #[error("k ({k}) must be <= number of vectors ({n})")]
    TooManyClusters { k: usize, n: usize },
    #[error("vector {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("iteration budget must be > 0")]
    ZeroIterations,
}

/// Knobs for a single clustering call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterParams {
    pub k: usize,
    pub distance: Distance,
    /// Maximum number of assign/update passes.
    pub iterations: usize,
    /// Seed for picking the initial centroids.
    pub seed: u64,
}

/// Result of a clustering call.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<Vec<f64>>,
    /// `assignments[i]` is the centroid index for input vector `i`.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    /// True when a pass left every assignment unchanged.
    pub converged: bool,
}

impl Clustering {
    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Number of members per centroid.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &a in &self.assignments {
            sizes[a] += 1;
        }
        sizes
    }
}

pub trait Clusterer: Send + Sync {
    fn cluster(
        &self,
        vectors: &[Vec<f64>],
        params: &ClusterParams,
    ) -> Result<Clustering, ClusterError>;
}

/// Lloyd's algorithm with seeded, distinct initial centroids.
///
/// Centroids are recomputed as member means for every metric. A centroid
/// that loses all members keeps its previous position.
#[derive(Clone, Debug, Default)]
pub struct KMeans;

impl KMeans {
    pub fn new() -> Self {
        Self
    }
}

impl Clusterer for KMeans {
    fn cluster(
        &self,
        vectors: &[Vec<f64>],
        params: &ClusterParams,
    ) -> Result<Clustering, ClusterError> {
        let dim = validate(vectors, params)?;
        let n = vectors.len();

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut centroids: Vec<Vec<f64>> = rand::seq::index::sample(&mut rng, n, params.k)
            .into_iter()
            .map(|i| vectors[i].clone())
            .collect();
        debug!(k = params.k, n, dim, distance = %params.distance, "initial centroids chosen");

        let mut assignments = vec![usize::MAX; n];
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..params.iterations {
            iterations += 1;

            let mut changed = 0usize;
            for (i, v) in vectors.iter().enumerate() {
                let best = nearest(v, &centroids, params.distance);
                if assignments[i] != best {
                    assignments[i] = best;
                    changed += 1;
                }
            }

            if changed == 0 {
                converged = true;
                break;
            }

            let empty = update_centroids(vectors, &assignments, &mut centroids, dim);
            if empty > 0 {
                warn!(empty, iteration = iterations, "clusters without members kept their centroid");
            }
        }

        info!(k = params.k, n, iterations, converged, "clustering finished");

        Ok(Clustering {
            centroids,
            assignments,
            iterations,
            converged,
        })
    }
}

fn validate(vectors: &[Vec<f64>], params: &ClusterParams) -> Result<usize, ClusterError> {
    if params.k == 0 {
        return Err(ClusterError::ZeroClusters);
    }
    if params.iterations == 0 {
        return Err(ClusterError::ZeroIterations);
    }
    let Some(first) = vectors.first() else {
        return Err(ClusterError::EmptyInput);
    };
    if params.k > vectors.len() {
        return Err(ClusterError::TooManyClusters {
            k: params.k,
            n: vectors.len(),
        });
    }
    let dim = first.len();
    if let Some((index, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dim) {
        return Err(ClusterError::DimensionMismatch {
            index,
            expected: dim,
            actual: v.len(),
        });
    }
    Ok(dim)
}

fn nearest(v: &[f64], centroids: &[Vec<f64>], distance: Distance) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, c) in centroids.iter().enumerate() {
        let d = distance.between(v, c);
        if d < best_dist {
            best_dist = d;
            best = j;
        }
    }
    best
}

/// Returns the number of centroids left without members.
fn update_centroids(
    vectors: &[Vec<f64>],
    assignments: &[usize],
    centroids: &mut [Vec<f64>],
    dim: usize,
) -> usize {
    let k = centroids.len();
    let mut sums = vec![vec![0.0f64; dim]; k];
    let mut counts = vec![0usize; k];

    for (v, &c) in vectors.iter().zip(assignments) {
        counts[c] += 1;
        for (s, x) in sums[c].iter_mut().zip(v) {
            *s += x;
        }
    }

    let mut empty = 0;
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count == 0 {
            empty += 1;
            continue;
        }
        *centroid = sum.into_iter().map(|s| s / count as f64).collect();
    }
    empty
}
