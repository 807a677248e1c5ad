//! Local Outlier Factor over a 2D point cloud.
//!
//! Scores every point of the cloud against its own neighbourhood (the point
//! itself is never its own neighbour). A factor near 1 means the point sits
//! at the same local density as its neighbours; larger means sparser.

use std::cmp::Ordering;

/// Added to the mean reachability distance so duplicate points do not
/// produce an infinite local reachability density.
const LRD_EPSILON: f64 = 1e-10;

/// Compute the outlier factor of every point.
///
/// # Arguments
/// * `points`: the cloud being scored
/// * `n_neighbors`: neighbourhood size, clamped to `points.len() - 1`
///
/// # Returns
/// One positive factor per input point, in input order.
pub fn local_outlier_factors(points: &[[f64; 2]], n_neighbors: usize) -> Vec<f64> {
    let n = points.len();
    if n < 2 {
        return vec![1.0; n];
    }
    let k = n_neighbors.clamp(1, n - 1);

    let neighbors: Vec<Vec<(f64, usize)>> = (0..n).map(|i| k_nearest(points, i, k)).collect();

    // Distance to the k-th neighbour of each point.
    let k_distance: Vec<f64> = neighbors.iter().map(|nb| nb[k - 1].0).collect();

    let lrd: Vec<f64> = neighbors
        .iter()
        .map(|nb| {
            let reach_sum: f64 = nb
                .iter()
                .map(|&(dist, j)| dist.max(k_distance[j]))
                .sum();
            1.0 / (reach_sum / k as f64 + LRD_EPSILON)
        })
        .collect();

    neighbors
        .iter()
        .enumerate()
        .map(|(i, nb)| {
            let neighbor_lrd: f64 = nb.iter().map(|&(_, j)| lrd[j]).sum::<f64>() / k as f64;
            neighbor_lrd / lrd[i]
        })
        .collect()
}

/// The `k` nearest points to `points[i]`, excluding `i`, as (distance, index)
/// sorted by distance then index.
fn k_nearest(points: &[[f64; 2]], i: usize, k: usize) -> Vec<(f64, usize)> {
    let p = points[i];
    let mut dists: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(j, q)| (euclidean(p, *q), j))
        .collect();
    if k < dists.len() {
        dists.select_nth_unstable_by(k - 1, by_distance);
        dists.truncate(k);
    }
    dists.sort_unstable_by(by_distance);
    dists
}

fn by_distance(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[inline]
fn euclidean(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(side: usize) -> Vec<[f64; 2]> {
        let mut pts = Vec::with_capacity(side * side);
        for i in 0..side {
            for j in 0..side {
                pts.push([i as f64, j as f64]);
            }
        }
        pts
    }

    #[test]
    fn uniform_grid_scores_near_one() {
        let pts = grid(8);
        let lof = local_outlier_factors(&pts, 20);
        assert_eq!(lof.len(), pts.len());
        for v in &lof {
            assert!(*v > 0.7 && *v < 2.0, "lof {} out of range", v);
        }
        let mean = lof.iter().sum::<f64>() / lof.len() as f64;
        assert!(mean > 0.9 && mean < 1.3);
    }

    #[test]
    fn distant_point_is_an_outlier() {
        let mut pts = grid(6);
        pts.push([100.0, 100.0]);
        let lof = local_outlier_factors(&pts, 20);
        let outlier = lof[lof.len() - 1];
        let inlier_max = lof[..lof.len() - 1].iter().copied().fold(0.0, f64::max);
        assert!(outlier > 5.0);
        assert!(outlier > inlier_max);
    }

    #[test]
    fn neighbor_count_is_clamped() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let lof = local_outlier_factors(&pts, 20);
        assert_eq!(lof.len(), 3);
        assert!(lof.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn duplicates_stay_finite() {
        let pts = vec![[1.0, 1.0]; 30];
        let lof = local_outlier_factors(&pts, 20);
        assert!(lof.iter().all(|v| (*v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn tiny_inputs() {
        assert!(local_outlier_factors(&[], 20).is_empty());
        assert_eq!(local_outlier_factors(&[[0.0, 0.0]], 20), vec![1.0]);
    }

    #[test]
    fn k_nearest_matches_full_sort() {
        let pts: Vec<[f64; 2]> = (0..60)
            .map(|i| [((i * 37) % 23) as f64, ((i * 11) % 7) as f64])
            .collect();
        for i in [0, 17, 59] {
            let mut all: Vec<(f64, usize)> = pts
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, q)| (euclidean(pts[i], *q), j))
                .collect();
            all.sort_by(by_distance);
            for k in [1, 5, 20, 59] {
                assert_eq!(k_nearest(&pts, i, k), all[..k].to_vec());
            }
        }
    }
}
