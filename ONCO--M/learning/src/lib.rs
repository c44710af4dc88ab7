#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! ONCO tumor-diagnosis stack: preprocessing, min/max scaled random forest, training and serving.

/// Fixed feature schema and column names.
#[path = "../schema.rs"]
pub mod schema;

/// Pipeline error taxonomy.
#[path = "../errors.rs"]
pub mod errors;

/// Raw CSV loading.
#[path = "../dataloader.rs"]
pub mod dataloader;

/// Column pruning, target encoding and feature/target splitting.
#[path = "../preprocessing.rs"]
pub mod preprocessing;

/// Scaler, forest, composed pipeline and artifact persistence.
#[path = "../classifier/main.rs"]
pub mod classifier;

/// Offline training orchestration.
#[path = "../training/main.rs"]
pub mod training;

/// Serving-side row alignment and prediction handle.
#[path = "../inference.rs"]
pub mod inference;

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

/// Telemetry helpers for structured logging.
#[path = "../telemetry.rs"]
pub mod telemetry;

#[cfg(test)]
#[path = "../fixtures.rs"]
mod fixtures;

pub use classifier::{
    artifact::{load_pipeline, save_pipeline, DEFAULT_MODEL_PATH},
    build_pipeline,
    forest::ForestParams,
    pipeline::DiagnosisPipeline,
    DiagnosisModel,
};
pub use config::OncoConfig;
pub use errors::{ErrorClass, PipelineError};
pub use inference::{
    predict_with_artifact, FeatureRow, HealthStatus, PredictionResult, PredictionService,
};
pub use training::{reporter::TrainingReport, train_and_save_pipeline, TrainingOrchestrator};
pub use telemetry::{LearningTelemetry, LearningTelemetryBuilder};
