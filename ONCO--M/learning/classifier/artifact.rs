use std::{fs, path::Path};

use super::pipeline::DiagnosisPipeline;
use crate::errors::PipelineError;

/// Default artifact location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";

/// Writes the pipeline as one JSON document, creating missing parent directories.
pub fn save_pipeline(pipeline: &DiagnosisPipeline, path: impl AsRef<Path>) -> Result<(), PipelineError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let encoded = serde_json::to_vec(pipeline)?;
    fs::write(path, encoded)?;
    Ok(())
}

/// Reads an artifact written by [`save_pipeline`].
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<DiagnosisPipeline, PipelineError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::ArtifactMissing {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|source| PipelineError::CorruptArtifact {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::{forest::ForestParams, DiagnosisModel},
        fixtures,
    };
    use tempfile::tempdir;

    #[test]
    fn reload_predicts_identically() {
        let (features, target) = fixtures::separable_features_and_target(30);
        let mut pipeline = DiagnosisPipeline::new(ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        });
        pipeline.fit(&features, &target).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        save_pipeline(&pipeline, &path).unwrap();
        assert!(path.is_file());

        let reloaded = load_pipeline(&path).unwrap();
        assert_eq!(reloaded, pipeline);
        assert_eq!(
            reloaded.predict(&features).unwrap(),
            pipeline.predict(&features).unwrap()
        );
        assert_eq!(
            reloaded.predict_probability(&features).unwrap(),
            pipeline.predict_probability(&features).unwrap()
        );
        assert_eq!(reloaded.feature_names(), pipeline.feature_names());
    }

    #[test]
    fn missing_artifact_names_path() {
        let err = load_pipeline("non_existent_path/model.json").unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactMissing { .. }));
        let message = err.to_string();
        assert!(message.contains("model pipeline not found"));
        assert!(message.contains("non_existent_path/model.json"));
    }

    #[test]
    fn garbage_artifact_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            load_pipeline(&path),
            Err(PipelineError::CorruptArtifact { .. })
        ));
    }
}
