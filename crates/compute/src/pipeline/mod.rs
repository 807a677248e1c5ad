//! Distribution anomaly pipeline.
//!
//! - [`features`]: per-distribution feature extraction and the parallel driver
//! - [`train`]: isolation forest training over the valid feature vectors
//! - [`score`]: per-pid scoring with a `NaN` sentinel for failed extractions

pub mod features;
pub mod score;
pub mod train;

pub use features::{extract_features, extract_features_parallel, extract_features_with};
pub use score::score_distributions;
pub use train::{train_classifier, train_classifier_with, AnomalyModel};
