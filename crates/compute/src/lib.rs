pub mod algorithms;
pub mod matrix;
pub mod parallel;
pub mod pipeline;

pub use algorithms::isolation_forest::{IsolationForest, Label};
pub use matrix::FeatureMatrix;
pub use parallel::{ParallelMap, RayonMap, SequentialMap};
pub use pipeline::{
    extract_features, extract_features_parallel, extract_features_with, score_distributions,
    train_classifier, train_classifier_with, AnomalyModel,
};
