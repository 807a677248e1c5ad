use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::Pid;

/// Feature vector dimensionality (15-dimensional distribution features).
pub const FEATURE_DIM: usize = 15;

/// Fixed-layout distribution summary:
/// [gmm_mean_x, gmm_mean_y, cov_xx, cov_xy, cov_yx, cov_yy,
///  center_x, center_y, spread_x, spread_y, lof_mean, lof_std,
///  pca_angle, eigenvalue_ratio, variance_explained]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub [f64; FEATURE_DIM]);

impl FeatureVector {
    pub const GMM_MEAN: usize = 0;
    pub const COVARIANCE: usize = 2;
    pub const CENTER: usize = 6;
    pub const SPREAD: usize = 8;
    pub const LOF_MEAN: usize = 10;
    pub const LOF_STD: usize = 11;
    pub const ANGLE: usize = 12;
    pub const EIGENVALUE_RATIO: usize = 13;
    pub const VARIANCE_EXPLAINED: usize = 14;

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn gmm_mean(&self) -> [f64; 2] {
        [self.0[Self::GMM_MEAN], self.0[Self::GMM_MEAN + 1]]
    }

    /// Row-major 2x2 covariance of the fitted Gaussian.
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        let c = Self::COVARIANCE;
        [[self.0[c], self.0[c + 1]], [self.0[c + 2], self.0[c + 3]]]
    }

    pub fn center(&self) -> [f64; 2] {
        [self.0[Self::CENTER], self.0[Self::CENTER + 1]]
    }

    pub fn spread(&self) -> [f64; 2] {
        [self.0[Self::SPREAD], self.0[Self::SPREAD + 1]]
    }

    pub fn lof_mean(&self) -> f64 {
        self.0[Self::LOF_MEAN]
    }

    pub fn lof_std(&self) -> f64 {
        self.0[Self::LOF_STD]
    }

    pub fn angle(&self) -> f64 {
        self.0[Self::ANGLE]
    }

    pub fn eigenvalue_ratio(&self) -> f64 {
        self.0[Self::EIGENVALUE_RATIO]
    }

    pub fn variance_explained(&self) -> f64 {
        self.0[Self::VARIANCE_EXPLAINED]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Why features could not be extracted from a distribution.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExtractionFailure {
    #[error("Distribution has too few points ({found} < {required})")]
    TooFewPoints { found: usize, required: usize },

    #[error("Distribution has zero variance on every axis")]
    DegenerateGeometry,

    #[error("Gaussian covariance is not positive definite")]
    NotPositiveDefinite,

    #[error("Feature {feature} is not finite")]
    NonFinite { feature: usize },

    #[error("Aspect ratio {aspect_ratio} is not a positive number")]
    InvalidAspectRatio { aspect_ratio: f64 },
}

/// Outcome of extracting one distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    Extracted(FeatureVector),
    Failed(ExtractionFailure),
}

/// Features (or the failure marker) for one distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub pid: Pid,
    #[serde(flatten)]
    pub extraction: Extraction,
}

impl FeatureRecord {
    pub fn extracted(pid: impl Into<Pid>, features: FeatureVector) -> Self {
        Self {
            pid: pid.into(),
            extraction: Extraction::Extracted(features),
        }
    }

    pub fn failed(pid: impl Into<Pid>, failure: ExtractionFailure) -> Self {
        Self {
            pid: pid.into(),
            extraction: Extraction::Failed(failure),
        }
    }

    /// The feature vector, or `None` when extraction failed.
    pub fn features(&self) -> Option<&FeatureVector> {
        match &self.extraction {
            Extraction::Extracted(fv) => Some(fv),
            Extraction::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match &self.extraction {
            Extraction::Extracted(_) => None,
            Extraction::Failed(f) => Some(f),
        }
    }
}

/// Anomaly score for one distribution. Lower is more anomalous; `NaN` marks a
/// distribution that was never scored because its features are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub pid: Pid,
    pub anomaly_score: f64,
}

impl ScoreRecord {
    pub fn unscored(pid: impl Into<Pid>) -> Self {
        Self {
            pid: pid.into(),
            anomaly_score: f64::NAN,
        }
    }

    pub fn is_unscored(&self) -> bool {
        self.anomaly_score.is_nan()
    }
}
