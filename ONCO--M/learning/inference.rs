use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_logging::LogLevel;

use crate::{
    classifier::{artifact::load_pipeline, DiagnosisModel},
    errors::PipelineError,
    schema::canonical_feature_name,
    telemetry::LearningTelemetry,
};

/// One sample's measurements keyed by display name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureRow {
    values: IndexMap<String, f64>,
}

impl FeatureRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(name, value)` pairs, validating each value.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut row = Self::new();
        for (name, value) in pairs {
            row.insert(name.as_ref(), value)?;
        }
        Ok(row)
    }

    /// Parses a JSON object of name → number.
    pub fn from_json_str(raw: &str) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| PipelineError::InvalidRow(format!("malformed JSON: {err}")))?;
        Self::from_json_value(&value)
    }

    /// Converts a JSON object of name → number.
    pub fn from_json_value(value: &Value) -> Result<Self, PipelineError> {
        let object = value.as_object().ok_or_else(|| {
            PipelineError::InvalidRow("expected a JSON object of feature values".into())
        })?;
        let mut row = Self::new();
        for (name, raw) in object {
            let number = raw
                .as_f64()
                .ok_or_else(|| PipelineError::InvalidRow(format!("`{name}` is not a number")))?;
            row.insert(name, number)?;
        }
        Ok(row)
    }

    /// Inserts a value under the display form of `name`. Negative and
    /// non-finite values are rejected.
    pub fn insert(&mut self, name: &str, value: f64) -> Result<(), PipelineError> {
        if !value.is_finite() {
            return Err(PipelineError::InvalidRow(format!("`{name}` must be finite")));
        }
        if value < 0.0 {
            return Err(PipelineError::InvalidRow(format!(
                "`{name}` must be non-negative, got {value}"
            )));
        }
        self.values
            .insert(canonical_feature_name(name).into_owned(), value);
        Ok(())
    }

    /// Value stored under a display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of features present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no feature is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(name, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Outcome of aligning a row against the recorded schema.
#[derive(Debug)]
pub struct AlignedRow {
    /// One-row frame in recorded order.
    pub frame: DataFrame,
    /// Recorded features absent from the row, filled with zero.
    pub zero_filled: Vec<String>,
    /// Row features not part of the recorded schema, dropped.
    pub dropped: Vec<String>,
}

/// Builds a one-row frame with exactly `names`, in that order. Absent
/// features become 0 and extras are dropped.
pub fn align_row(row: &FeatureRow, names: &[String]) -> Result<AlignedRow, PipelineError> {
    let mut zero_filled = Vec::new();
    let columns: Vec<Series> = names
        .iter()
        .map(|name| {
            let value = row.get(name).unwrap_or_else(|| {
                zero_filled.push(name.clone());
                0.0
            });
            Series::new(name, &[value])
        })
        .collect();
    let dropped = row
        .iter()
        .filter(|(name, _)| !names.iter().any(|known| known.as_str() == *name))
        .map(|(name, _)| name.to_owned())
        .collect();
    Ok(AlignedRow {
        frame: DataFrame::new(columns)?,
        zero_filled,
        dropped,
    })
}

fn frame_in_row_order(row: &FeatureRow) -> Result<DataFrame, PipelineError> {
    let columns: Vec<Series> = row
        .iter()
        .map(|(name, value)| Series::new(name, &[value]))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Single-row prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = benign, 1 = malignant.
    pub prediction: u8,
    /// Probability of class 0.
    pub probability_benign: f64,
    /// Probability of class 1.
    pub probability_malignant: f64,
}

/// Liveness snapshot of a [`PredictionService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `healthy` while the process answers.
    pub status: String,
    /// Whether a model is available for predictions.
    pub model_loaded: bool,
    /// Artifact location the service was pointed at.
    pub model_path: PathBuf,
}

/// Read-only serving handle; clone it freely across threads.
#[derive(Clone)]
pub struct PredictionService {
    model: Option<Arc<dyn DiagnosisModel>>,
    model_path: PathBuf,
    telemetry: LearningTelemetry,
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("model_loaded", &self.model.is_some())
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl PredictionService {
    /// Loads the artifact, failing when it is missing or unreadable.
    pub fn load(
        path: impl AsRef<Path>,
        telemetry: LearningTelemetry,
    ) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let pipeline = load_pipeline(path)?;
        telemetry.emit(
            LogLevel::Info,
            "model_loaded",
            json!({ "model_path": path.display().to_string() }),
        );
        Ok(Self {
            model: Some(Arc::new(pipeline)),
            model_path: path.to_path_buf(),
            telemetry,
        })
    }

    /// Loads the artifact, or starts without a model when that fails.
    #[must_use]
    pub fn load_or_unavailable(path: impl AsRef<Path>, telemetry: LearningTelemetry) -> Self {
        let path = path.as_ref();
        match Self::load(path, telemetry.clone()) {
            Ok(service) => service,
            Err(err) => {
                telemetry.emit(
                    LogLevel::Error,
                    "model_unavailable",
                    json!({ "model_path": path.display().to_string(), "error": err.to_string() }),
                );
                Self {
                    model: None,
                    model_path: path.to_path_buf(),
                    telemetry,
                }
            }
        }
    }

    /// Wraps an already fitted model.
    #[must_use]
    pub fn from_model(model: Arc<dyn DiagnosisModel>, telemetry: LearningTelemetry) -> Self {
        Self {
            model: Some(model),
            model_path: PathBuf::new(),
            telemetry,
        }
    }

    /// True when predictions can be served.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Health snapshot.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".into(),
            model_loaded: self.is_loaded(),
            model_path: self.model_path.clone(),
        }
    }

    /// Aligns `row` to the recorded schema and predicts it.
    pub fn predict(&self, row: &FeatureRow) -> Result<PredictionResult, PipelineError> {
        let model = self.model.as_ref().ok_or(PipelineError::ModelNotLoaded)?;
        let frame = if let Some(names) = model.feature_names() {
            let aligned = align_row(row, names)?;
            if !aligned.zero_filled.is_empty() || !aligned.dropped.is_empty() {
                self.telemetry.emit(
                    LogLevel::Debug,
                    "features_zero_filled",
                    json!({ "zero_filled": aligned.zero_filled, "dropped": aligned.dropped }),
                );
            }
            aligned.frame
        } else {
            self.telemetry.emit(
                LogLevel::Warn,
                "feature_names_missing",
                json!({ "fallback": "row order", "features": row.len() }),
            );
            frame_in_row_order(row)?
        };

        let labels = model.predict(&frame)?;
        let probabilities = model.predict_probability(&frame)?;
        let (Some(&prediction), Some(&[benign, malignant])) =
            (labels.first(), probabilities.first())
        else {
            return Err(PipelineError::EmptyPrediction);
        };
        let result = PredictionResult {
            prediction,
            probability_benign: benign,
            probability_malignant: malignant,
        };
        self.telemetry.emit(
            LogLevel::Info,
            "prediction_served",
            json!({
                "prediction": result.prediction,
                "probability_malignant": result.probability_malignant,
            }),
        );
        Ok(result)
    }
}

/// Loads the artifact at `path` and predicts one row.
pub fn predict_with_artifact(
    row: &FeatureRow,
    path: impl AsRef<Path>,
) -> Result<PredictionResult, PipelineError> {
    PredictionService::load(path, LearningTelemetry::default())?.predict(row)
}
