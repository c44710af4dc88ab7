use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    errors::PipelineError,
    schema::{BENIGN_LABEL, DIAGNOSIS_COLUMN, ID_COLUMN, MALIGNANT_LABEL, SPURIOUS_COLUMN},
};

/// Removes dataset-format artifacts (identifier and spurious trailing column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPruner {
    columns: Vec<String>,
}

impl Default for ColumnPruner {
    fn default() -> Self {
        Self::new([ID_COLUMN, SPURIOUS_COLUMN])
    }
}

impl ColumnPruner {
    /// Creates a pruner for the given column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Column names this pruner removes.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn is_prunable(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Returns a copy of `df` without the prunable columns; absent ones are ignored.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, PipelineError> {
        let doomed: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| self.is_prunable(name))
            .map(str::to_owned)
            .collect();
        let mut pruned = df.clone();
        for name in doomed {
            pruned.drop_in_place(&name)?;
        }
        Ok(pruned)
    }
}

/// Drops the `id` and `Unnamed: 32` columns when present.
pub fn drop_unnecessary_columns(df: &DataFrame) -> Result<DataFrame, PipelineError> {
    ColumnPruner::default().apply(df)
}

fn encode_label(label: Option<&str>) -> Option<f64> {
    match label {
        Some(MALIGNANT_LABEL) => Some(1.0),
        Some(BENIGN_LABEL) => Some(0.0),
        _ => None,
    }
}

/// Replaces the `diagnosis` column with its numeric encoding (M = 1, B = 0).
///
/// Unknown labels, non-text label columns and an absent column all produce
/// nulls; the only errors are internal dataframe failures.
pub fn map_diagnosis_to_numerical(mut df: DataFrame) -> Result<DataFrame, PipelineError> {
    let height = df.height();
    let mut encoded: Float64Chunked = match df.column(DIAGNOSIS_COLUMN) {
        Ok(series) if series.dtype() == &DataType::Utf8 => {
            series.utf8()?.into_iter().map(encode_label).collect()
        }
        _ => Float64Chunked::full_null(DIAGNOSIS_COLUMN, height),
    };
    encoded.rename(DIAGNOSIS_COLUMN);
    df.with_column(encoded.into_series())?;
    Ok(df)
}

/// Splits a frame into features (every column but `diagnosis`) and the target.
///
/// This is where a missing label column becomes fatal.
pub fn prepare_features_and_target(df: &DataFrame) -> Result<(DataFrame, Series), PipelineError> {
    let target = df
        .column(DIAGNOSIS_COLUMN)
        .map_err(|_| PipelineError::MissingColumn(DIAGNOSIS_COLUMN.to_owned()))?
        .clone();
    let features = df.drop(DIAGNOSIS_COLUMN)?;
    Ok((features, target))
}
