use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder for learning telemetry sinks.
pub struct LearningTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    stderr: bool,
    min_level: LogLevel,
}

impl LearningTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            stderr: false,
            min_level: LogLevel::Info,
        }
    }

    /// Sets the JSON-lines log file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Mirrors records to stderr.
    #[must_use]
    pub fn stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    /// Drops records below `level` on every sink.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<LearningTelemetry> {
        let mut sinks = Vec::new();
        if let Some(path) = self.log_path {
            sinks.push(JsonLogger::new(path)?.with_min_level(self.min_level));
        }
        if self.stderr {
            sinks.push(JsonLogger::stderr().with_min_level(self.min_level));
        }
        Ok(LearningTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sinks,
            }),
        })
    }
}

/// Telemetry handle shared by the training and serving components.
#[derive(Clone)]
pub struct LearningTelemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    module: String,
    sinks: Vec<JsonLogger>,
}

impl fmt::Debug for LearningTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningTelemetry")
            .field("module", &self.inner.module)
            .field("sinks", &self.inner.sinks.len())
            .finish()
    }
}

impl Default for LearningTelemetry {
    fn default() -> Self {
        Self::disabled("onco-learning")
    }
}

impl LearningTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> LearningTelemetryBuilder {
        LearningTelemetryBuilder::new(module)
    }

    /// A handle with no sinks; every call is a no-op.
    #[must_use]
    pub fn disabled(module: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                module: module.into(),
                sinks: Vec::new(),
            }),
        }
    }

    /// Module name stamped on every record.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Logs structured metadata to every sink.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if self.inner.sinks.is_empty() {
            return Ok(());
        }
        let record = LogRecord::new(&self.inner.module, level, message).with_metadata(&metadata);
        for sink in &self.inner.sinks {
            sink.log(&record)?;
        }
        Ok(())
    }

    /// Like [`Self::log`] but reports sink failures on stderr instead of returning them.
    pub fn emit(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Err(err) = self.log(level, message, metadata) {
            eprintln!("telemetry log failed: {err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn writes_records_with_module_and_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/learning.log");
        let telemetry = LearningTelemetry::builder("onco-training")
            .log_path(&path)
            .min_level(LogLevel::Debug)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "training_completed", json!({ "accuracy": 0.9 }))
            .unwrap();
        let clone = telemetry.clone();
        clone.emit(LogLevel::Debug, "features_zero_filled", json!({ "count": 5 }));

        let lines: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["module"], "onco-training");
        assert_eq!(lines[0]["message"], "training_completed");
        assert_eq!(lines[0]["metadata"]["accuracy"], 0.9);
        assert_eq!(lines[1]["metadata"]["count"], 5);
    }

    #[test]
    fn min_level_filters_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.log");
        let telemetry = LearningTelemetry::builder("onco-serving")
            .log_path(&path)
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        telemetry.emit(LogLevel::Info, "prediction_served", json!({}));
        telemetry.emit(LogLevel::Warn, "feature_names_missing", json!({}));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("feature_names_missing"));
    }

    #[test]
    fn disabled_handle_is_silent() {
        let telemetry = LearningTelemetry::default();
        assert_eq!(telemetry.module(), "onco-learning");
        assert!(telemetry.log(LogLevel::Error, "ignored", json!({})).is_ok());
    }
}
