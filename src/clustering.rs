//! K-means over document-topic weights.
//!
//! 1. Seed centroids with k-means++ (distance-squared weighted sampling)
//! 2. Assign each point to its nearest centroid (squared Euclidean)
//! 3. Move centroids to the mean of their points; an emptied cluster takes
//!    the point lying farthest from its current centroid
//! 4. Stop once the total squared centroid shift falls under the tolerance
//!
//! The whole procedure is restarted `n_init` times and the run with the
//! lowest inertia wins.

use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    /// Relative to the mean per-feature variance of the data.
    pub tolerance: f64,
    pub n_init: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Clustering {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        KMeans {
            k,
            max_iterations: 300,
            tolerance: 1e-4,
            n_init: 10,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&self, data: &Array2<f64>) -> Result<Clustering> {
        let n = data.nrows();
        if self.k == 0 || self.k > n {
            return Err(AnalysisError::InvalidParameter(format!(
                "cannot form {} clusters from {} points",
                self.k, n
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let tol = self.tolerance * mean_variance(data);

        let mut best: Option<Clustering> = None;
        for run in 0..self.n_init.max(1) {
            let seeds = kmeans_plus_plus(data, self.k, &mut rng);
            let candidate = self.lloyd(data, seeds, tol);
            debug!("k-means run {}: inertia {:.6} after {} iterations", run, candidate.inertia, candidate.iterations);
            if best.as_ref().map_or(true, |b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| AnalysisError::InvalidParameter("k-means produced no run".into()))
    }

    fn lloyd(&self, data: &Array2<f64>, mut centroids: Array2<f64>, tol: f64) -> Clustering {
        let n = data.nrows();
        let mut assignments = vec![0usize; n];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;

            for (i, point) in data.rows().into_iter().enumerate() {
                assignments[i] = nearest(point, &centroids).0;
            }

            let mut updated = Array2::<f64>::zeros(centroids.dim());
            let mut counts = vec![0usize; self.k];
            for (i, point) in data.rows().into_iter().enumerate() {
                let mut row = updated.row_mut(assignments[i]);
                row += &point;
                counts[assignments[i]] += 1;
            }

            for cluster in 0..self.k {
                if counts[cluster] == 0 {
                    let farthest = farthest_point(data, &centroids, &assignments);
                    updated.row_mut(cluster).assign(&data.row(farthest));
                } else {
                    let size = counts[cluster] as f64;
                    updated.row_mut(cluster).mapv_inplace(|v| v / size);
                }
            }

            let shift: f64 = (&updated - &centroids).mapv(|v| v * v).sum();
            centroids = updated;
            if shift <= tol {
                break;
            }
        }

        let mut inertia = 0.0;
        for (i, point) in data.rows().into_iter().enumerate() {
            let (cluster, distance) = nearest(point, &centroids);
            assignments[i] = cluster;
            inertia += distance;
        }

        Clustering {
            assignments,
            centroids: centroids.rows().into_iter().map(|row| row.to_vec()).collect(),
            inertia,
            iterations,
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the closest centroid; ties go to the lower index.
fn nearest(point: ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best.1 {
            best = (c, distance);
        }
    }
    best
}

fn farthest_point(data: &Array2<f64>, centroids: &Array2<f64>, assignments: &[usize]) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, point) in data.rows().into_iter().enumerate() {
        let distance = squared_distance(point, centroids.row(assignments[i]));
        if distance > best.1 {
            best = (i, distance);
        }
    }
    best.0
}

fn mean_variance(data: &Array2<f64>) -> f64 {
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}

fn kmeans_plus_plus(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));
    let mut closest: Vec<f64> = data
        .rows()
        .into_iter()
        .map(|point| squared_distance(point, data.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = closest.iter().rposition(|d| *d > 0.0).unwrap_or(n - 1);
            for (i, d) in closest.iter().enumerate() {
                if target < *d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // all remaining points coincide with a chosen centroid
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, point) in data.rows().into_iter().enumerate() {
            closest[i] = closest[i].min(squared_distance(point, data.row(chosen)));
        }
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separates_two_groups() {
        let data = array![
            [0.90, 0.10],
            [0.85, 0.15],
            [0.95, 0.05],
            [0.10, 0.90],
            [0.12, 0.88],
            [0.05, 0.95],
        ];
        let result = KMeans::new(2).fit(&data).unwrap();

        let a = result.assignments[0];
        assert!(result.assignments[..3].iter().all(|&c| c == a));
        assert!(result.assignments[3..].iter().all(|&c| c != a));
        assert!(result.inertia < 0.05);
    }

    #[test]
    fn test_each_point_its_own_cluster_when_k_equals_n() {
        let data = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let result = KMeans::new(3).fit(&data).unwrap();
        let mut labels = result.assignments.clone();
        labels.sort();
        assert_eq!(labels, vec![0, 1, 2]);
        assert!(result.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_identical_points_do_not_panic() {
        let data = array![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        let result = KMeans::new(3).fit(&data).unwrap();
        assert!(result.assignments.iter().all(|&c| c < 3));
        assert_eq!(result.centroids.len(), 3);
    }

    #[test]
    fn test_same_seed_same_result() {
        let data = array![[0.2, 0.8], [0.3, 0.7], [0.9, 0.1], [0.6, 0.4], [0.5, 0.5]];
        let first = KMeans::new(3).with_seed(7).fit(&data).unwrap();
        let second = KMeans::new(3).with_seed(7).fit(&data).unwrap();
        assert_eq!(first.assignments, second.assignments);
    }

    #[test]
    fn test_too_many_clusters_rejected() {
        let data = array![[0.1, 0.9]];
        assert!(KMeans::new(2).fit(&data).is_err());
        assert!(KMeans::new(0).fit(&data).is_err());
    }
}
