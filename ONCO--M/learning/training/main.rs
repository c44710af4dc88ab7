//! Offline training: load, encode, split, fit, evaluate and persist.

/// Training report.
pub mod reporter;
/// Seeded train/test split and accuracy.
pub mod split;

use std::path::{Path, PathBuf};

use chrono::Utc;
use reporter::TrainingReport;
use serde_json::{json, Value};
use shared_logging::LogLevel;
use split::{accuracy, train_test_split};
use uuid::Uuid;

use crate::{
    classifier::{
        artifact::{save_pipeline, DEFAULT_MODEL_PATH},
        build_pipeline,
        forest::ForestParams,
        pipeline::target_labels,
        DiagnosisModel,
    },
    config::{OncoConfig, DEFAULT_DATA_PATH},
    dataloader::load_raw_data,
    errors::PipelineError,
    preprocessing::{map_diagnosis_to_numerical, prepare_features_and_target},
    schema::DIAGNOSIS_COLUMN,
    telemetry::LearningTelemetry,
};

/// Wires loader → encoder → splitter → pipeline and writes one artifact.
#[derive(Debug, Clone)]
pub struct TrainingOrchestrator {
    data_path: PathBuf,
    model_path: PathBuf,
    test_ratio: f64,
    params: ForestParams,
    telemetry: Option<LearningTelemetry>,
}

impl Default for TrainingOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH, DEFAULT_MODEL_PATH)
    }
}

impl TrainingOrchestrator {
    /// Creates an orchestrator with default split and forest settings.
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            model_path: model_path.into(),
            test_ratio: 0.2,
            params: ForestParams::default(),
            telemetry: None,
        }
    }

    /// Creates an orchestrator from loaded configuration.
    #[must_use]
    pub fn from_config(config: &OncoConfig) -> Self {
        Self::new(&config.paths.data, &config.paths.model)
            .with_test_ratio(config.training.test_ratio)
            .with_params(config.forest_params())
    }

    /// Overrides the held-out fraction.
    #[must_use]
    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.test_ratio = ratio;
        self
    }

    /// Overrides the forest hyper-parameters (and split seed).
    #[must_use]
    pub fn with_params(mut self, params: ForestParams) -> Self {
        self.params = params;
        self
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: LearningTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Runs one training pass. Accuracy is reported, never used to block persistence.
    pub fn run(&self) -> Result<TrainingReport, PipelineError> {
        self.log(
            LogLevel::Info,
            "training_started",
            json!({
                "data_path": self.data_path.display().to_string(),
                "model_path": self.model_path.display().to_string(),
            }),
        );
        let raw = load_raw_data(&self.data_path)?;
        self.log(
            LogLevel::Info,
            "data_loaded",
            json!({ "rows": raw.height(), "columns": raw.width() }),
        );
        if raw.column(DIAGNOSIS_COLUMN).is_err() {
            return Err(PipelineError::MissingColumn(DIAGNOSIS_COLUMN.to_owned()));
        }
        let encoded = map_diagnosis_to_numerical(raw)?;
        let (features, target) = prepare_features_and_target(&encoded)?;
        target_labels(&target)?;

        let split = train_test_split(&features, &target, self.test_ratio, self.params.seed)?;
        let mut pipeline = build_pipeline(self.params);
        pipeline.fit(&split.train_features, &split.train_target)?;

        let predicted = pipeline.predict(&split.test_features)?;
        let expected = target_labels(&split.test_target)?;
        let accuracy = accuracy(&predicted, &expected);
        self.log(
            LogLevel::Info,
            "training_completed",
            json!({
                "accuracy": accuracy,
                "train_rows": split.train_features.height(),
                "test_rows": split.test_features.height(),
                "n_trees": self.params.n_trees,
            }),
        );

        save_pipeline(&pipeline, &self.model_path)?;
        self.log(
            LogLevel::Info,
            "artifact_persisted",
            json!({ "model_path": self.model_path.display().to_string() }),
        );

        Ok(TrainingReport {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            data_path: self.data_path.clone(),
            model_path: self.model_path.clone(),
            train_rows: split.train_features.height(),
            test_rows: split.test_features.height(),
            accuracy,
            n_trees: self.params.n_trees,
        })
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.emit(level, message, metadata);
        }
    }
}

/// Trains on `data_path` with default settings and writes the artifact to `model_path`.
pub fn train_and_save_pipeline(
    data_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
) -> Result<TrainingReport, PipelineError> {
    let report =
        TrainingOrchestrator::new(data_path.as_ref(), model_path.as_ref()).run()?;
    println!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::artifact::load_pipeline,
        fixtures,
        inference::{FeatureRow, PredictionService},
    };
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn saves_model_and_creates_directory() {
        let dir = tempdir().unwrap();
        let data_path = fixtures::write_dummy_csv(dir.path());
        let model_dir = dir.path().join("temp_models");
        let model_path = model_dir.join("test_model.json");
        assert!(!model_dir.exists());

        let report = train_and_save_pipeline(&data_path, &model_path).unwrap();

        assert!(model_dir.is_dir());
        assert!(model_path.is_file());
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert_eq!(report.train_rows, 8);
        assert_eq!(report.test_rows, 2);

        let loaded = load_pipeline(&model_path).unwrap();
        assert_eq!(loaded.feature_names().map(<[String]>::len), Some(30));

        let service = PredictionService::load(&model_path, LearningTelemetry::default()).unwrap();
        let row = FeatureRow::from_pairs(fixtures::dummy_row(0)).unwrap();
        let result = service.predict(&row).unwrap();
        assert!(result.prediction <= 1);
        assert!((0.0..=1.0).contains(&result.probability_benign));
        assert!((0.0..=1.0).contains(&result.probability_malignant));
        assert!((result.probability_benign + result.probability_malignant - 1.0).abs() < 1e-9);
    }

    #[test]
    fn separable_data_scores_perfectly_and_logs() {
        let dir = tempdir().unwrap();
        let data_path = fixtures::write_separable_csv(dir.path(), 40);
        let log_path = dir.path().join("train.log");
        let telemetry = LearningTelemetry::builder("onco-training")
            .log_path(&log_path)
            .build()
            .unwrap();
        let report = TrainingOrchestrator::new(&data_path, dir.path().join("model.json"))
            .with_params(ForestParams {
                n_trees: 20,
                ..ForestParams::default()
            })
            .with_telemetry(telemetry)
            .run()
            .unwrap();
        assert!((report.accuracy - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.test_rows, 8);

        let loaded = load_pipeline(dir.path().join("model.json")).unwrap();
        let names = loaded.feature_names().unwrap();
        assert_eq!(names.len(), 30);
        assert_eq!(names.last().map(String::as_str), Some("fractal_dimension_worst"));

        let log = fs::read_to_string(&log_path).unwrap();
        for event in ["training_started", "data_loaded", "training_completed", "artifact_persisted"] {
            assert!(log.contains(event), "missing {event}");
        }
    }

    #[test]
    fn missing_label_column_is_fatal() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("unlabelled.csv");
        fs::write(&data_path, "id,radius_mean\n1,10.0\n2,11.0\n3,12.0\n").unwrap();
        let model_path = dir.path().join("model.json");
        let err = TrainingOrchestrator::new(&data_path, &model_path)
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref name) if name == "diagnosis"));
        assert!(!model_path.exists());
    }

    #[test]
    fn unknown_labels_are_rejected_before_fitting() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("odd.csv");
        fs::write(
            &data_path,
            "id,diagnosis,radius_mean\n1,M,10.0\n2,B,11.0\n3,X,12.0\n",
        )
        .unwrap();
        let err = TrainingOrchestrator::new(&data_path, dir.path().join("model.json"))
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownLabels { count: 1 }));
    }

    #[test]
    fn unreadable_source_is_fatal() {
        let dir = tempdir().unwrap();
        let err = train_and_save_pipeline(dir.path().join("absent.csv"), dir.path().join("m.json"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
