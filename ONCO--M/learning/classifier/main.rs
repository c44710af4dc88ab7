//! Diagnosis classifier: scaling, tree ensemble, composed pipeline and its artifact.

/// Artifact persistence.
pub mod artifact;
/// Bagged tree ensemble.
pub mod forest;
/// Prune → scale → forest composition.
pub mod pipeline;
/// Per-feature min/max scaling.
pub mod scaler;
/// CART decision tree.
pub mod tree;

use polars::prelude::{DataFrame, Series};

use crate::errors::PipelineError;
use forest::ForestParams;
use pipeline::DiagnosisPipeline;

/// Capability shared by every fitted diagnosis model the serving layer can hold.
pub trait DiagnosisModel: Send + Sync {
    /// Learns from a feature frame and its `{0, 1}` target.
    fn fit(&mut self, features: &DataFrame, target: &Series) -> Result<(), PipelineError>;

    /// Hard labels, one per row.
    fn predict(&self, features: &DataFrame) -> Result<Vec<u8>, PipelineError>;

    /// `[benign, malignant]` probabilities, one pair per row.
    fn predict_probability(&self, features: &DataFrame) -> Result<Vec<[f64; 2]>, PipelineError>;

    /// Feature names recorded at fit time, if any.
    fn feature_names(&self) -> Option<&[String]>;
}

/// Builds an unfitted pipeline with the given forest hyper-parameters.
#[must_use]
pub fn build_pipeline(params: ForestParams) -> DiagnosisPipeline {
    DiagnosisPipeline::new(params)
}
