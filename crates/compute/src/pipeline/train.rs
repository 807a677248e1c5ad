use std::time::Instant;

use tracing::info;

use scatter_core::config::TrainingConfig;
use scatter_core::{FeatureRecord, ScatterError};

use crate::algorithms::isolation_forest::{IsolationForest, Label};
use crate::matrix::FeatureMatrix;
use crate::parallel::{ParallelMap, RayonMap};

/// Trained distribution-level anomaly model.
///
/// Immutable once returned from [`train_classifier`]; concurrent scoring
/// against a shared reference is safe.
#[derive(Debug, Clone)]
pub struct AnomalyModel {
    forest: IsolationForest,
    training_rows: usize,
}

impl AnomalyModel {
    /// Raw scores, lower = more anomalous.
    pub fn score_samples(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ScatterError> {
        self.forest.score_samples(features)
    }

    pub fn decision_function(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ScatterError> {
        self.forest.decision_function(features)
    }

    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, ScatterError> {
        self.forest.predict(features)
    }

    /// Label a score produced by this model. `NaN` (unscored) is never anomalous.
    pub fn label(&self, score: f64) -> Option<Label> {
        if score.is_nan() {
            None
        } else {
            Some(self.forest.label(score))
        }
    }

    /// Score threshold calibrated from the contamination parameter.
    pub fn threshold(&self) -> f64 {
        self.forest.offset()
    }

    pub fn n_features(&self) -> usize {
        self.forest.n_features()
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }
}

/// Stack the present feature vectors into a matrix, skipping failed records.
pub(crate) fn present_feature_matrix<'a, I>(records: I) -> Result<FeatureMatrix, ScatterError>
where
    I: IntoIterator<Item = &'a FeatureRecord>,
{
    FeatureMatrix::from_rows(
        records
            .into_iter()
            .filter_map(|r| r.features())
            .map(|fv| fv.as_slice()),
    )
}

/// Train an anomaly model on a population of feature records.
///
/// Records whose extraction failed are discarded. Training on a population
/// with no usable records is an error, never a degraded model.
///
/// # Arguments
/// * `records`: extracted features of the training population
/// * `config`: contamination, ensemble size and seed
/// * `n_jobs`: threads for fitting trees (0 = all cores)
pub fn train_classifier(
    records: &[FeatureRecord],
    config: &TrainingConfig,
    n_jobs: usize,
) -> Result<AnomalyModel, ScatterError> {
    train_classifier_with(records, config, &RayonMap::new(n_jobs))
}

/// [`train_classifier`] with an explicit parallel-map strategy.
pub fn train_classifier_with<P: ParallelMap>(
    records: &[FeatureRecord],
    config: &TrainingConfig,
    mapper: &P,
) -> Result<AnomalyModel, ScatterError> {
    let start = Instant::now();

    let matrix = present_feature_matrix(records)?;
    let forest = IsolationForest::fit(&matrix, config, mapper)?;

    info!(
        "Anomaly training: {} of {} distributions usable, {} trees, contamination={}, threshold={:.4} ({:.2}s)",
        matrix.n_rows(),
        records.len(),
        forest.n_estimators(),
        config.contamination,
        forest.offset(),
        start.elapsed().as_secs_f64()
    );

    Ok(AnomalyModel {
        forest,
        training_rows: matrix.n_rows(),
    })
}
