use std::collections::HashSet;
use std::time::Instant;

use tracing::info;

use scatter_core::{FeatureRecord, ScatterError, ScoreRecord};

use crate::algorithms::isolation_forest::Label;

use super::train::{present_feature_matrix, AnomalyModel};

/// Score a batch of distributions with a trained model.
///
/// Every input record produces exactly one [`ScoreRecord`] with the same pid:
/// scored records first (in input order), then the records whose extraction
/// failed, each carrying the `NaN` sentinel.
///
/// # Errors
/// * [`ScatterError::DuplicatePid`]: a pid appears more than once
/// * [`ScatterError::NonFiniteFeature`] / [`ScatterError::DimensionMismatch`]:
///   present features the model cannot score
pub fn score_distributions(
    model: &AnomalyModel,
    records: &[FeatureRecord],
) -> Result<Vec<ScoreRecord>, ScatterError> {
    let start = Instant::now();

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.pid.as_str()) {
            return Err(ScatterError::DuplicatePid(record.pid.clone()));
        }
    }

    let (present, absent): (Vec<&FeatureRecord>, Vec<&FeatureRecord>) =
        records.iter().partition(|r| r.features().is_some());

    let mut scores = Vec::with_capacity(records.len());

    if !present.is_empty() {
        let matrix = present_feature_matrix(present.iter().copied())?;
        let raw = model.score_samples(&matrix)?;
        scores.extend(present.iter().zip(raw).map(|(record, anomaly_score)| ScoreRecord {
            pid: record.pid.clone(),
            anomaly_score,
        }));
    }

    scores.extend(absent.iter().map(|record| ScoreRecord::unscored(record.pid.clone())));

    let flagged = scores
        .iter()
        .filter(|s| model.label(s.anomaly_score) == Some(Label::Anomalous))
        .count();
    info!(
        "Scoring: {} distributions scored, {} unscored, {} below threshold ({:.2}s)",
        present.len(),
        absent.len(),
        flagged,
        start.elapsed().as_secs_f64()
    );

    Ok(scores)
}
