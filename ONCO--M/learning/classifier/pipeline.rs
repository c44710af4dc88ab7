use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    forest::{ForestParams, RandomForest},
    scaler::MinMaxScaler,
    DiagnosisModel,
};
use crate::{errors::PipelineError, preprocessing::ColumnPruner};

/// Prune → min/max scale → random forest, fitted once and reused for prediction.
///
/// This is the unit persisted as the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisPipeline {
    /// Feature names after pruning, in fit order. Absent in legacy artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
    pruner: ColumnPruner,
    scaler: MinMaxScaler,
    classifier: RandomForest,
}

impl Default for DiagnosisPipeline {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl DiagnosisPipeline {
    /// Creates an unfitted pipeline.
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self {
            feature_names: None,
            pruner: ColumnPruner::default(),
            scaler: MinMaxScaler::default(),
            classifier: RandomForest::new(params),
        }
    }

    /// Fitted scaler.
    #[must_use]
    pub const fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Forest hyper-parameters.
    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        self.classifier.params()
    }

    fn scaled(&self, features: &DataFrame) -> Result<Array2<f64>, PipelineError> {
        let pruned = self.pruner.apply(features)?;
        let matrix = frame_to_matrix(&pruned)?;
        self.scaler.transform(&matrix)
    }
}

impl DiagnosisModel for DiagnosisPipeline {
    fn fit(&mut self, features: &DataFrame, target: &Series) -> Result<(), PipelineError> {
        if features.height() == 0 || features.height() != target.len() {
            return Err(PipelineError::EmptyOrMisaligned {
                features: features.height(),
                targets: target.len(),
            });
        }
        let labels = target_labels(target)?;
        let pruned = self.pruner.apply(features)?;
        let matrix = frame_to_matrix(&pruned)?;
        self.scaler.fit(&matrix)?;
        let scaled = self.scaler.transform(&matrix)?;
        self.classifier.fit(&scaled, &labels)?;
        self.feature_names = Some(
            pruned
                .get_column_names()
                .into_iter()
                .map(str::to_owned)
                .collect(),
        );
        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<u8>, PipelineError> {
        self.classifier.predict(&self.scaled(features)?)
    }

    fn predict_probability(&self, features: &DataFrame) -> Result<Vec<[f64; 2]>, PipelineError> {
        self.classifier.predict_proba(&self.scaled(features)?)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

/// Converts every column to `f64` in frame order. Nulls (including text that
/// does not parse as a number) are rejected.
pub fn frame_to_matrix(df: &DataFrame) -> Result<Array2<f64>, PipelineError> {
    let mut matrix = Array2::<f64>::zeros((df.height(), df.width()));
    for (col, series) in df.get_columns().iter().enumerate() {
        let cast = series.cast(&DataType::Float64)?;
        let values = cast.f64()?;
        if values.null_count() > 0 {
            return Err(PipelineError::MissingValues {
                column: series.name().to_owned(),
                count: values.null_count(),
            });
        }
        for (row, value) in values.into_no_null_iter().enumerate() {
            matrix[[row, col]] = value;
        }
    }
    Ok(matrix)
}

/// Reads a `{0, 1}` target; nulls and any other value fail with [`PipelineError::UnknownLabels`].
pub fn target_labels(target: &Series) -> Result<Vec<u8>, PipelineError> {
    let cast = target.cast(&DataType::Float64)?;
    let mut unknown = 0;
    let labels: Vec<u8> = cast
        .f64()?
        .into_iter()
        .map(|value| match value {
            Some(v) if v == 1.0 => 1,
            Some(v) if v == 0.0 => 0,
            _ => {
                unknown += 1;
                0
            }
        })
        .collect();
    if unknown > 0 {
        return Err(PipelineError::UnknownLabels { count: unknown });
    }
    Ok(labels)
}
