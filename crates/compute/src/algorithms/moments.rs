//! Per-axis moments of a point set.
//!
//! Used for the centroid/spread features and as the first step of the
//! Gaussian and PCA fits.

/// Compute per-axis mean and population standard deviation.
///
/// Returns (means, stddevs). An empty input yields zeros.
pub fn axis_stats<const D: usize>(rows: &[[f64; D]]) -> ([f64; D], [f64; D]) {
    if rows.is_empty() {
        return ([0.0; D], [0.0; D]);
    }

    let means = axis_means(rows);
    let n = rows.len() as f64;

    let mut variance = [0.0; D];
    for row in rows {
        for i in 0..D {
            let diff = row[i] - means[i];
            variance[i] += diff * diff;
        }
    }

    let mut stddevs = [0.0; D];
    for i in 0..D {
        stddevs[i] = (variance[i] / n).sqrt();
    }

    (means, stddevs)
}

/// Per-axis arithmetic mean.
pub fn axis_means<const D: usize>(rows: &[[f64; D]]) -> [f64; D] {
    let mut means = [0.0; D];
    if rows.is_empty() {
        return means;
    }
    for row in rows {
        for i in 0..D {
            means[i] += row[i];
        }
    }
    let n = rows.len() as f64;
    for m in &mut means {
        *m /= n;
    }
    means
}

/// Scatter matrix of 2D points around `center`, divided by `denominator`.
pub(crate) fn scatter_2d(points: &[[f64; 2]], center: [f64; 2], denominator: f64) -> [[f64; 2]; 2] {
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p[0] - center[0];
        let dy = p[1] - center[1];
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    [
        [sxx / denominator, sxy / denominator],
        [sxy / denominator, syy / denominator],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_stats_basic() {
        let data = [[1.0, 2.0], [3.0, 4.0]];
        let (means, stddevs) = axis_stats(&data);
        assert!((means[0] - 2.0).abs() < 1e-12);
        assert!((means[1] - 3.0).abs() < 1e-12);
        // Population std: sqrt(((1-2)^2 + (3-2)^2) / 2) = 1
        assert!((stddevs[0] - 1.0).abs() < 1e-12);
        assert!((stddevs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn axis_stats_empty() {
        let (means, stddevs) = axis_stats::<2>(&[]);
        assert_eq!(means, [0.0, 0.0]);
        assert_eq!(stddevs, [0.0, 0.0]);
    }

    #[test]
    fn constant_axis_has_zero_spread() {
        let data = [[5.0, 0.0], [5.0, 1.0], [5.0, 2.0]];
        let (_, stddevs) = axis_stats(&data);
        assert_eq!(stddevs[0], 0.0);
        assert!(stddevs[1] > 0.0);
    }

    #[test]
    fn scatter_is_symmetric() {
        let pts = [[0.0, 0.0], [1.0, 2.0], [2.0, 1.0]];
        let center = axis_means(&pts);
        let s = scatter_2d(&pts, center, pts.len() as f64);
        assert_eq!(s[0][1], s[1][0]);
        assert!(s[0][0] > 0.0 && s[1][1] > 0.0);
    }
}
