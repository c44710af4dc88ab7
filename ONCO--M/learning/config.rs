use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared_logging::LogLevel;

use crate::classifier::{artifact::DEFAULT_MODEL_PATH, forest::ForestParams};

/// Default training source.
pub const DEFAULT_DATA_PATH: &str = "data/data.csv";

/// Runtime configuration for training and serving, usually read from `onco.toml`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OncoConfig {
    /// Input and artifact locations.
    pub paths: PathSettings,
    /// Split settings.
    pub training: TrainingSettings,
    /// Forest hyper-parameters.
    pub forest: ForestSettings,
    /// Log sink settings.
    pub logging: LoggingSettings,
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Source CSV.
    pub data: PathBuf,
    /// Artifact file.
    pub model: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA_PATH),
            model: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// `[training]` section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_ratio: f64,
    /// Seed shared by the split shuffle and the forest.
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// `[forest]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum depth; omit for unlimited.
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
}

impl Default for ForestSettings {
    fn default() -> Self {
        let params = ForestParams::default();
        Self {
            n_trees: params.n_trees,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level (`debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Optional JSON-lines log file.
    pub path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            path: None,
        }
    }
}

impl OncoConfig {
    /// Loads and validates a TOML file. Relative paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.paths.data = resolve(&source_dir, &config.paths.data);
        config.paths.model = resolve(&source_dir, &config.paths.model);
        if let Some(log_path) = &config.logging.path {
            config.logging.path = Some(resolve(&source_dir, log_path));
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns validated defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.training.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            bail!("training.test_ratio must be in (0, 1), got {ratio}");
        }
        if self.forest.n_trees == 0 {
            bail!("forest.n_trees must be at least 1");
        }
        if self.forest.min_samples_split < 2 {
            bail!("forest.min_samples_split must be at least 2");
        }
        if self.forest.min_samples_leaf == 0 {
            bail!("forest.min_samples_leaf must be at least 1");
        }
        if self.forest.max_depth == Some(0) {
            bail!("forest.max_depth must be at least 1 when set");
        }
        self.log_level()?;
        Ok(())
    }

    /// Parsed minimum log level.
    pub fn log_level(&self) -> Result<LogLevel> {
        self.logging
            .level
            .parse()
            .with_context(|| format!("invalid logging.level `{}`", self.logging.level))
    }

    /// Forest hyper-parameters, seeded from `[training]`.
    #[must_use]
    pub const fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.forest.n_trees,
            max_depth: self.forest.max_depth,
            min_samples_split: self.forest.min_samples_split,
            min_samples_leaf: self.forest.min_samples_leaf,
            seed: self.training.seed,
        }
    }
}

fn resolve(base: &Path, candidate: &Path) -> PathBuf {
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}
