//! A from-scratch batch DBSCAN used purely as a test oracle, mirroring the
//! corpus's own `DBSCAN::run` (`math/clustering/dbscan.rs`) but over
//! runtime-dimensional `Vec<f64>` points and exposed in terms of this
//! crate's `Metric`.

use incremental_dbscan::Metric;

const NOISE: i64 = -1;
const UNCLASSIFIED: i64 = -2;

/// Labels every point in `points` via a textbook batch DBSCAN.
///
/// # Returns
/// A vector parallel to `points`, where each entry is `-1` for noise or a
/// non-negative cluster index otherwise. Cluster indices are arbitrary and
/// only meaningful up to a renaming (i.e. for isomorphism comparisons).
pub fn label_all(points: &[Vec<f64>], eps: f64, min_pts: usize, metric: Metric) -> Vec<i64> {
    let n = points.len();
    let mut labels = vec![UNCLASSIFIED; n];
    let mut next_cluster = 0i64;

    for i in 0..n {
        if labels[i] != UNCLASSIFIED {
            continue;
        }
        let neighbors = region_query(points, i, eps, metric);
        if neighbors.len() < min_pts {
            labels[i] = NOISE;
            continue;
        }
        expand_cluster(points, &mut labels, i, neighbors, next_cluster, eps, min_pts, metric);
        next_cluster += 1;
    }

    labels
}

fn expand_cluster(
    points: &[Vec<f64>],
    labels: &mut [i64],
    seed: usize,
    mut seeds: Vec<usize>,
    cluster: i64,
    eps: f64,
    min_pts: usize,
    metric: Metric,
) {
    labels[seed] = cluster;
    let mut i = 0;
    while i < seeds.len() {
        let current = seeds[i];
        if labels[current] == NOISE {
            labels[current] = cluster;
        }
        if labels[current] == UNCLASSIFIED {
            labels[current] = cluster;
            let neighbors = region_query(points, current, eps, metric);
            if neighbors.len() >= min_pts {
                for n in neighbors {
                    if !seeds.contains(&n) {
                        seeds.push(n);
                    }
                }
            }
        }
        i += 1;
    }
}

fn region_query(points: &[Vec<f64>], index: usize, eps: f64, metric: Metric) -> Vec<usize> {
    (0..points.len())
        .filter(|&j| {
            metric
                .measure(&points[index], &points[j])
                .is_some_and(|d| d <= eps)
        })
        .collect()
}

/// Whether two label assignments over the same-length point set are
/// isomorphic: there exists a bijection between non-noise label values of
/// `a` and of `b` such that relabeling `a` through it yields `b` exactly
/// (noise must match noise at every index).
pub fn are_isomorphic(a: &[i64], b: &[i64]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    use std::collections::HashMap;
    let mut forward: HashMap<i64, i64> = HashMap::new();
    let mut backward: HashMap<i64, i64> = HashMap::new();

    for (&x, &y) in a.iter().zip(b.iter()) {
        if (x == NOISE) != (y == NOISE) {
            return false;
        }
        if x == NOISE {
            continue;
        }
        match (forward.get(&x), backward.get(&y)) {
            (None, None) => {
                forward.insert(x, y);
                backward.insert(y, x);
            }
            (Some(&mapped), _) if mapped != y => return false,
            (_, Some(&mapped)) if mapped != x => return false,
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brute_force_single_cluster() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.5, 0.5]];
        let labels = label_all(&points, 1.5, 3, Metric::Euclidean);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_ne!(labels[0], NOISE);
    }

    #[test]
    fn test_brute_force_all_noise() {
        let points = vec![vec![0.0, 0.0], vec![100.0, 100.0]];
        let labels = label_all(&points, 1.5, 3, Metric::Euclidean);
        assert_eq!(labels, vec![NOISE, NOISE]);
    }

    #[test]
    fn test_isomorphism_relabeling() {
        assert!(are_isomorphic(&[0, 0, 1, -1], &[5, 5, 2, -1]));
        assert!(!are_isomorphic(&[0, 0, 1, -1], &[5, 2, 2, -1]));
        assert!(!are_isomorphic(&[0, -1], &[0, 0]));
    }
}
