use thiserror::Error;

/// Pipeline-level failures. Per-distribution extraction problems are not
/// errors; they travel as [`crate::ExtractionFailure`] inside the record.
#[derive(Error, Debug)]
pub enum ScatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Feature matrix is empty: no distribution produced features")]
    EmptyFeatureMatrix,

    #[error("Feature matrix row {row} has {found} columns, expected {expected}")]
    RaggedFeatureMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Feature matrix row {row} has a non-finite value in column {column}")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("Duplicate pid in batch: {0}")]
    DuplicatePid(String),

    #[error("Model expects {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ScatterError {
    fn from(e: serde_json::Error) -> Self {
        ScatterError::Serialize(e.to_string())
    }
}
