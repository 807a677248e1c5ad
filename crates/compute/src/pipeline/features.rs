use std::time::Instant;

use tracing::{debug, info};

use scatter_core::config::ExtractionConfig;
use scatter_core::{
    Extraction, ExtractionFailure, FeatureRecord, FeatureVector, LoadResult, FEATURE_DIM,
};

use crate::algorithms::gaussian::{fit_gaussian, DEFAULT_REG_COVAR};
use crate::algorithms::lof::local_outlier_factors;
use crate::algorithms::moments::axis_stats;
use crate::algorithms::pca::fit_pca;
use crate::parallel::{ParallelMap, RayonMap};

/// Floor on the secondary explained-variance share, so the eigenvalue ratio
/// of a (near-)collinear cloud is capped at 1e12 instead of going infinite.
const MIN_SECONDARY_VARIANCE_RATIO: f64 = 1e-12;

/// Extract the feature vector of one distribution.
///
/// Never fails outright: too few points or a numerical problem comes back as
/// an [`Extraction::Failed`] record carrying the same pid.
pub fn extract_features(load_result: &LoadResult, config: &ExtractionConfig) -> FeatureRecord {
    let extraction = match distribution_features(load_result, config) {
        Ok(fv) => Extraction::Extracted(fv),
        Err(failure) => {
            debug!(pid = %load_result.pid, reason = %failure, "feature extraction failed");
            Extraction::Failed(failure)
        }
    };
    FeatureRecord {
        pid: load_result.pid.clone(),
        extraction,
    }
}

fn distribution_features(
    load_result: &LoadResult,
    config: &ExtractionConfig,
) -> Result<FeatureVector, ExtractionFailure> {
    let n = load_result.points.len();
    if n < config.min_points {
        return Err(ExtractionFailure::TooFewPoints {
            found: n,
            required: config.min_points,
        });
    }
    if !(config.aspect_ratio.is_finite() && config.aspect_ratio > 0.0) {
        return Err(ExtractionFailure::InvalidAspectRatio {
            aspect_ratio: config.aspect_ratio,
        });
    }
    // Checked on raw coordinates: rescaling leaves rounding noise behind.
    let identical = load_result
        .points
        .first()
        .map_or(true, |first| load_result.points.iter().all(|p| p == first));
    if identical {
        return Err(ExtractionFailure::DegenerateGeometry);
    }

    // Correct for the non-square sensor before any shape statistic.
    let points: Vec<[f64; 2]> = load_result
        .points
        .iter()
        .map(|p| [p.x / config.aspect_ratio, p.y])
        .collect();

    let gaussian = fit_gaussian(&points, DEFAULT_REG_COVAR)?;
    let (center, spread) = axis_stats(&points);

    let lof = local_outlier_factors(&points, config.lof_neighbors);
    let (lof_mean, lof_std) = {
        let ([mean], [std]) = axis_stats(&lof.iter().map(|v| [*v]).collect::<Vec<_>>());
        (mean, std)
    };

    let pca = fit_pca(&points).ok_or(ExtractionFailure::DegenerateGeometry)?;
    let [dominant, secondary] = pca.explained_variance_ratio;
    let eigenvalue_ratio = dominant / secondary.max(MIN_SECONDARY_VARIANCE_RATIO);

    let mut features = [0.0; FEATURE_DIM];
    features[FeatureVector::GMM_MEAN..FeatureVector::COVARIANCE].copy_from_slice(&gaussian.mean);
    features[FeatureVector::COVARIANCE..FeatureVector::CENTER]
        .copy_from_slice(&gaussian.covariance_flat());
    features[FeatureVector::CENTER..FeatureVector::SPREAD].copy_from_slice(&center);
    features[FeatureVector::SPREAD..FeatureVector::LOF_MEAN].copy_from_slice(&spread);
    features[FeatureVector::LOF_MEAN] = lof_mean;
    features[FeatureVector::LOF_STD] = lof_std;
    features[FeatureVector::ANGLE] = pca.angle();
    features[FeatureVector::EIGENVALUE_RATIO] = eigenvalue_ratio;
    features[FeatureVector::VARIANCE_EXPLAINED] = dominant;

    if let Some(feature) = features.iter().position(|v| !v.is_finite()) {
        return Err(ExtractionFailure::NonFinite { feature });
    }

    Ok(FeatureVector(features))
}

/// Extract every distribution through the given parallel-map strategy.
///
/// Output is positional: `records[i]` belongs to `load_results[i]`.
pub fn extract_features_with<P: ParallelMap>(
    load_results: &[LoadResult],
    config: &ExtractionConfig,
    mapper: &P,
) -> Vec<FeatureRecord> {
    let start = Instant::now();
    let records = mapper.map(load_results, |lr| extract_features(lr, config));

    let failed = records.iter().filter(|r| r.features().is_none()).count();
    info!(
        "Feature extraction: {} distributions, {} extracted, {} failed ({:.2}s)",
        records.len(),
        records.len() - failed,
        failed,
        start.elapsed().as_secs_f64()
    );

    records
}

/// Extract every distribution on a rayon pool of `n_jobs` threads (0 = all cores).
pub fn extract_features_parallel(
    load_results: &[LoadResult],
    config: &ExtractionConfig,
    n_jobs: usize,
) -> Vec<FeatureRecord> {
    extract_features_with(load_results, config, &RayonMap::new(n_jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use scatter_core::Point;

    fn random_cloud(pid: &str, n: usize, seed: u64) -> LoadResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        LoadResult::new(
            pid,
            (0..n).map(|_| Point::new(rng.gen_range(0.0..1380.0), rng.gen_range(0.0..1034.0))),
        )
    }

    fn features_of(record: &FeatureRecord) -> &FeatureVector {
        record.features().expect("expected extracted features")
    }

    #[test]
    fn too_few_points_always_fail() {
        let config = ExtractionConfig::default();
        for n in [0, 1, 5, 29] {
            let record = extract_features(&random_cloud("small", n, n as u64), &config);
            assert_eq!(record.pid, "small");
            assert_eq!(
                record.failure(),
                Some(&ExtractionFailure::TooFewPoints {
                    found: n,
                    required: 30
                })
            );
        }
    }

    #[test]
    fn minimum_point_count_is_enough() {
        let record = extract_features(&random_cloud("edge", 30, 30), &ExtractionConfig::default());
        assert!(features_of(&record).is_finite());
    }

    #[test]
    fn random_cloud_yields_full_vector() {
        let record = extract_features(&random_cloud("D1", 40, 11), &ExtractionConfig::default());
        let fv = features_of(&record);
        assert_eq!(fv.as_slice().len(), FEATURE_DIM);
        assert!(fv.is_finite());
        assert!(fv.angle().abs() <= std::f64::consts::PI);
        assert!(fv.eigenvalue_ratio() >= 1.0);
        assert!(fv.variance_explained() >= 0.5 && fv.variance_explained() <= 1.0);
    }

    #[test]
    fn gaussian_and_moment_features_agree() {
        let record = extract_features(&random_cloud("D2", 60, 12), &ExtractionConfig::default());
        let fv = features_of(&record);

        // A single Gaussian component is centred on the sample mean.
        let [mx, my] = fv.gmm_mean();
        let [cx, cy] = fv.center();
        assert!((mx - cx).abs() < 1e-9 && (my - cy).abs() < 1e-9);

        // Its diagonal is the population variance plus regularization.
        let cov = fv.covariance();
        let [sx, sy] = fv.spread();
        assert!((cov[0][0] - sx * sx - DEFAULT_REG_COVAR).abs() < 1e-6);
        assert!((cov[1][1] - sy * sy - DEFAULT_REG_COVAR).abs() < 1e-6);
        assert_eq!(cov[0][1], cov[1][0]);
        assert!(fv.lof_mean() > 0.5 && fv.lof_std() >= 0.0);
    }

    #[test]
    fn x_is_divided_by_aspect_ratio() {
        let base = random_cloud("D3", 45, 13);
        let stretched = LoadResult::new(
            "D3",
            base.points.iter().map(|p| Point::new(p.x * 2.0, p.y)),
        );

        let plain = extract_features(&base, &ExtractionConfig::with_aspect_ratio(1.0));
        let corrected = extract_features(&stretched, &ExtractionConfig::with_aspect_ratio(2.0));
        assert_eq!(plain, corrected);

        // y is never rescaled.
        let fv = features_of(&corrected);
        let raw_mean_y = base.points.iter().map(|p| p.y).sum::<f64>() / base.len() as f64;
        assert!((fv.center()[1] - raw_mean_y).abs() < 1e-9);
    }

    #[test]
    fn extraction_is_idempotent() {
        let cloud = random_cloud("D4", 80, 14);
        let config = ExtractionConfig::default();
        let a = extract_features(&cloud, &config);
        let b = extract_features(&cloud, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn identical_points_are_degenerate() {
        let cloud = LoadResult::new("flat", vec![Point::new(5.0, 5.0); 40]);
        let record = extract_features(&cloud, &ExtractionConfig::default());
        assert_eq!(record.failure(), Some(&ExtractionFailure::DegenerateGeometry));
    }

    #[test]
    fn collinear_cloud_caps_eigenvalue_ratio() {
        let cloud = LoadResult::new("line", (0..40).map(|i| Point::new(i as f64, 100.0)));
        let record = extract_features(&cloud, &ExtractionConfig::with_aspect_ratio(1.0));
        let fv = features_of(&record);
        assert!(fv.eigenvalue_ratio().is_finite());
        assert_eq!(fv.eigenvalue_ratio(), 1.0 / MIN_SECONDARY_VARIANCE_RATIO);
        assert_eq!(fv.angle(), 0.0);
        assert_eq!(fv.variance_explained(), 1.0);
    }

    #[test]
    fn invalid_aspect_ratio_fails_without_panicking() {
        let cloud = random_cloud("D5", 40, 15);
        for ratio in [0.0, -1.36, f64::NAN, f64::INFINITY] {
            let record = extract_features(&cloud, &ExtractionConfig::with_aspect_ratio(ratio));
            assert!(matches!(
                record.failure(),
                Some(ExtractionFailure::InvalidAspectRatio { .. })
            ));
        }
    }

    #[test]
    fn nearly_identical_points_are_not_degenerate() {
        let mut points = vec![Point::new(5.0, 5.0); 39];
        points.push(Point::new(5.0, 5.5));
        let record = extract_features(
            &LoadResult::new("blip", points),
            &ExtractionConfig::default(),
        );
        assert!(record.features().is_some());
    }

    #[test]
    fn driver_keeps_positions_and_failures() {
        let mut batch: Vec<LoadResult> = (0..10)
            .map(|i| random_cloud(&format!("ok-{}", i), 35, 100 + i))
            .collect();
        batch.insert(4, random_cloud("tiny", 3, 99));

        let records = extract_features_parallel(&batch, &ExtractionConfig::default(), 3);
        assert_eq!(records.len(), batch.len());
        for (lr, rec) in batch.iter().zip(&records) {
            assert_eq!(lr.pid, rec.pid);
        }
        assert!(records[4].features().is_none());
        assert_eq!(records.iter().filter(|r| r.features().is_some()).count(), 10);
    }
}
