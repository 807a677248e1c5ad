//! Single-component Gaussian mixture fit.
//!
//! With one component every responsibility is 1, so the EM fixed point is
//! reached in a single step: the maximum-likelihood mean and the biased
//! covariance, regularized on the diagonal.

use scatter_core::ExtractionFailure;

use super::moments::{axis_means, scatter_2d};

/// Non-negative regularization added to the covariance diagonal.
pub const DEFAULT_REG_COVAR: f64 = 1e-6;

/// A fitted bivariate Gaussian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    pub mean: [f64; 2],
    pub covariance: [[f64; 2]; 2],
}

impl GaussianFit {
    /// Covariance flattened row-major: [xx, xy, yx, yy].
    pub fn covariance_flat(&self) -> [f64; 4] {
        let c = &self.covariance;
        [c[0][0], c[0][1], c[1][0], c[1][1]]
    }
}

/// Fit a full-covariance Gaussian to 2D points.
///
/// Fails when the regularized covariance has no Cholesky factor, i.e. it is
/// not positive definite (or not finite).
pub fn fit_gaussian(points: &[[f64; 2]], reg_covar: f64) -> Result<GaussianFit, ExtractionFailure> {
    if points.is_empty() {
        return Err(ExtractionFailure::DegenerateGeometry);
    }

    let mean = axis_means(points);
    let mut covariance = scatter_2d(points, mean, points.len() as f64);
    covariance[0][0] += reg_covar;
    covariance[1][1] += reg_covar;

    if !is_positive_definite(&covariance) {
        return Err(ExtractionFailure::NotPositiveDefinite);
    }

    Ok(GaussianFit { mean, covariance })
}

/// Sylvester's criterion for a symmetric 2x2 matrix: a Cholesky factor
/// exists iff the leading minors are positive.
fn is_positive_definite(m: &[[f64; 2]; 2]) -> bool {
    let a = m[0][0];
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    a.is_finite() && det.is_finite() && a > 0.0 && det > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_mean_and_biased_covariance() {
        let pts = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
        let fit = fit_gaussian(&pts, 0.0).unwrap();
        assert_eq!(fit.mean, [1.0, 1.0]);
        // Each axis: mean squared deviation = 1, no correlation.
        assert!((fit.covariance[0][0] - 1.0).abs() < 1e-12);
        assert!((fit.covariance[1][1] - 1.0).abs() < 1e-12);
        assert!(fit.covariance[0][1].abs() < 1e-12);
    }

    #[test]
    fn regularization_lands_on_diagonal() {
        let pts = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
        let fit = fit_gaussian(&pts, DEFAULT_REG_COVAR).unwrap();
        assert!((fit.covariance[0][0] - (1.0 + DEFAULT_REG_COVAR)).abs() < 1e-12);
        assert_eq!(fit.covariance[0][1], fit.covariance[1][0]);
        let flat = fit.covariance_flat();
        assert_eq!(flat[1], flat[2]);
    }

    #[test]
    fn collinear_points_without_regularization_fail() {
        let pts: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 2.0 * i as f64]).collect();
        assert_eq!(
            fit_gaussian(&pts, 0.0),
            Err(ExtractionFailure::NotPositiveDefinite)
        );
        // Regularization rescues the fit.
        assert!(fit_gaussian(&pts, DEFAULT_REG_COVAR).is_ok());
    }

    #[test]
    fn non_finite_input_fails() {
        let pts = [[f64::INFINITY, 0.0], [1.0, 1.0]];
        assert!(fit_gaussian(&pts, DEFAULT_REG_COVAR).is_err());
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(
            fit_gaussian(&[], DEFAULT_REG_COVAR),
            Err(ExtractionFailure::DegenerateGeometry)
        );
    }
}
