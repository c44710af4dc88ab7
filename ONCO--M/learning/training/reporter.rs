use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Completion timestamp.
    pub trained_at: DateTime<Utc>,
    /// Source CSV.
    pub data_path: PathBuf,
    /// Written artifact.
    pub model_path: PathBuf,
    /// Rows used for fitting.
    pub train_rows: usize,
    /// Held-out rows.
    pub test_rows: usize,
    /// Held-out accuracy in [0, 1].
    pub accuracy: f64,
    /// Trees in the fitted forest.
    pub n_trees: usize,
}

impl TrainingReport {
    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "[train] accuracy={:.2} train_rows={} test_rows={} trees={} artifact={}",
            self.accuracy,
            self.train_rows,
            self.test_rows,
            self.n_trees,
            self.model_path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_accuracy_and_artifact() {
        let report = TrainingReport {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            data_path: PathBuf::from("data/data.csv"),
            model_path: PathBuf::from("models/model.json"),
            train_rows: 455,
            test_rows: 114,
            accuracy: 0.964_912,
            n_trees: 100,
        };
        let summary = report.summary();
        assert!(summary.contains("accuracy=0.96"));
        assert!(summary.contains("models/model.json"));
    }
}
