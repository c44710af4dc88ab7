use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Coarse classification used by serving layers to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No usable model is available (not trained yet, or not loaded).
    ServiceUnavailable,
    /// The caller sent a row that cannot be interpreted.
    ClientError,
    /// Anything else.
    Internal,
}

/// Errors raised by the diagnosis pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The persisted artifact does not exist.
    #[error("model pipeline not found at {}; train the model first", path.display())]
    ArtifactMissing {
        /// Path that was probed.
        path: PathBuf,
    },
    /// The artifact exists but could not be decoded.
    #[error("model artifact at {} is unreadable: {source}", path.display())]
    CorruptArtifact {
        /// Artifact path.
        path: PathBuf,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The serving handle was constructed without a model.
    #[error("model not loaded; ensure the model is trained and available")]
    ModelNotLoaded,
    /// The source table could not be read or parsed.
    #[error("failed to read source table {}: {source}", path.display())]
    SourceData {
        /// Source path.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: PolarsError,
    },
    /// A required column is absent.
    #[error("column `{0}` not found")]
    MissingColumn(String),
    /// A feature column holds null values where numbers are required.
    #[error("column `{column}` contains {count} missing value(s)")]
    MissingValues {
        /// Offending column.
        column: String,
        /// Number of nulls.
        count: usize,
    },
    /// Target rows carry labels outside {0, 1}.
    #[error("{count} target row(s) have no usable diagnosis label")]
    UnknownLabels {
        /// Number of unusable labels.
        count: usize,
    },
    /// Features and target disagree on row count, or the frame is empty.
    #[error("cannot fit on {features} feature row(s) and {targets} target row(s)")]
    EmptyOrMisaligned {
        /// Feature rows.
        features: usize,
        /// Target rows.
        targets: usize,
    },
    /// Prediction was requested before fitting.
    #[error("pipeline has not been fitted")]
    NotFitted,
    /// The feature matrix width differs from what the pipeline was fitted on.
    #[error("expected {expected} feature column(s), found {found}")]
    ShapeMismatch {
        /// Width seen at fit time.
        expected: usize,
        /// Width received.
        found: usize,
    },
    /// The model returned no output for a non-empty input.
    #[error("model produced no prediction for the row")]
    EmptyPrediction,
    /// A request row failed validation.
    #[error("invalid feature row: {0}")]
    InvalidRow(String),
    /// Dataframe operation failure.
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
    /// I/O error (filesystem).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Maps the error to the response class a serving layer should use.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::ArtifactMissing { .. } | Self::CorruptArtifact { .. } | Self::ModelNotLoaded => {
                ErrorClass::ServiceUnavailable
            }
            Self::InvalidRow(_) => ErrorClass::ClientError,
            _ => ErrorClass::Internal,
        }
    }
}
