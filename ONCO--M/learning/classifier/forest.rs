use ndarray::Array2;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use crate::errors::PipelineError;

/// Hyper-parameters of the bagged tree ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum depth per tree; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
    /// Seed for bootstrap sampling and feature selection.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Random forest classifier over `{0 = benign, 1 = malignant}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Creates an unfitted forest.
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    /// Hyper-parameters in use.
    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Number of fitted trees.
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Fits every tree on its own bootstrap sample. Refitting replaces all trees.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(PipelineError::EmptyOrMisaligned {
                features: n,
                targets: y.len(),
            });
        }
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features: max_features(x.ncols()),
        };
        let mut rng = SmallRng::seed_from_u64(self.params.seed);
        self.trees = (0..self.params.n_trees.max(1))
            .map(|_| {
                let mut tree_rng = SmallRng::seed_from_u64(rng.gen());
                let samples: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, &samples, &tree_params, &mut tree_rng)
            })
            .collect();
        self.n_features = x.ncols();
        Ok(())
    }

    /// Mean `[benign, malignant]` distribution across trees, one per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<[f64; 2]>, PipelineError> {
        if self.trees.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::ShapeMismatch {
                expected: self.n_features,
                found: x.ncols(),
            });
        }
        let count = self.trees.len() as f64;
        Ok(x.outer_iter()
            .map(|row| {
                let total = self.trees.iter().fold([0.0, 0.0], |acc, tree| {
                    let p = tree.predict_row(row);
                    [acc[0] + p[0], acc[1] + p[1]]
                });
                [total[0] / count, total[1] / count]
            })
            .collect())
    }

    /// Hard labels; malignant only when its mean probability is strictly higher.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, PipelineError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p[1] > p[0]))
            .collect())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}
