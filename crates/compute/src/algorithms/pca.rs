//! Two-component PCA for 2D point clouds, via the closed-form
//! eigendecomposition of the sample covariance.

use super::moments::{axis_means, scatter_2d};

/// Principal axes of a point cloud, dominant first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcaFit {
    /// Unit axis directions. Each is signed so its largest-magnitude entry
    /// is positive.
    pub components: [[f64; 2]; 2],
    /// Variance along each axis (sample covariance, n - 1 denominator).
    pub explained_variance: [f64; 2],
    /// Share of total variance along each axis.
    pub explained_variance_ratio: [f64; 2],
}

impl PcaFit {
    /// Angle of the dominant axis in radians, in (-pi, pi].
    pub fn angle(&self) -> f64 {
        let c = self.components[0];
        c[1].atan2(c[0])
    }
}

/// Fit PCA. Returns `None` for fewer than two points, or when the total
/// variance is indistinguishable from rounding noise at the cloud's scale.
pub fn fit_pca(points: &[[f64; 2]]) -> Option<PcaFit> {
    if points.len() < 2 {
        return None;
    }

    let mean = axis_means(points);
    let cov = scatter_2d(points, mean, (points.len() - 1) as f64);
    let (a, b, d) = (cov[0][0], cov[0][1], cov[1][1]);

    let half_trace = (a + d) / 2.0;
    let radius = (((a - d) / 2.0).powi(2) + b * b).sqrt();
    let lambda1 = half_trace + radius;
    let lambda2 = (half_trace - radius).max(0.0);

    let total = lambda1 + lambda2;
    let scale = mean[0] * mean[0] + mean[1] * mean[1] + 1.0;
    if !(total.is_finite() && total > f64::EPSILON * scale) {
        return None;
    }

    let first = if b.abs() > f64::EPSILON * total {
        normalize([lambda1 - d, b])
    } else if a >= d {
        [1.0, 0.0]
    } else {
        [0.0, 1.0]
    };
    let second = [-first[1], first[0]];

    Some(PcaFit {
        components: [flip_sign(first), flip_sign(second)],
        explained_variance: [lambda1, lambda2],
        explained_variance_ratio: [lambda1 / total, lambda2 / total],
    })
}

fn normalize(v: [f64; 2]) -> [f64; 2] {
    let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
    [v[0] / norm, v[1] / norm]
}

/// Deterministic sign: the entry with the largest magnitude is positive.
fn flip_sign(v: [f64; 2]) -> [f64; 2] {
    let dominant = if v[1].abs() > v[0].abs() { v[1] } else { v[0] };
    if dominant < 0.0 {
        [-v[0], -v[1]]
    } else {
        v
    }
}
