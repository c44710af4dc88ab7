use ndarray::{Array2, ArrayView1};
use rand::{rngs::SmallRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum samples each child must keep.
    pub min_samples_leaf: usize,
    /// Informative features inspected per split.
    pub max_features: usize,
}

/// Arena node of a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Terminal node holding the class distribution `[benign, malignant]`.
    Leaf {
        /// Fraction of training samples per class.
        probability: [f64; 2],
    },
    /// Internal node; samples with `x[feature] <= threshold` go left.
    Split {
        /// Column index.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Index of the left child.
        left: usize,
        /// Index of the right child.
        right: usize,
    },
}

/// Binary CART classifier using Gini impurity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
}

impl DecisionTree {
    /// Grows a tree over the rows listed in `samples` (duplicates allowed).
    #[must_use]
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut SmallRng,
    ) -> Self {
        let mut tree = Self::default();
        if !samples.is_empty() {
            tree.grow(x, y, samples.to_vec(), 0, params, rng);
        }
        tree
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the leaf distribution for one row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { probability }) => return *probability,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => idx = if row[*feature] <= *threshold { *left } else { *right },
                None => return [0.5, 0.5],
            }
        }
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut SmallRng,
    ) -> usize {
        let counts = class_counts(y, &samples);
        let idx = self.nodes.len();
        let n = samples.len();
        let pure = counts[0] == 0 || counts[1] == 0;
        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if pure
            || depth_reached
            || n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
        {
            self.nodes.push(leaf(counts));
            return idx;
        }
        let Some(split) = best_split(x, y, &samples, counts, params, rng) else {
            self.nodes.push(leaf(counts));
            return idx;
        };
        self.nodes.push(leaf(counts));
        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&sample| x[[sample, split.feature]] <= split.threshold);
        let left = self.grow(x, y, left_samples, depth + 1, params, rng);
        let right = self.grow(x, y, right_samples, depth + 1, params, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

fn class_counts(y: &[u8], samples: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &sample in samples {
        counts[usize::from(y[sample])] += 1;
    }
    counts
}

fn leaf(counts: [usize; 2]) -> Node {
    let total = (counts[0] + counts[1]) as f64;
    Node::Leaf {
        probability: [counts[0] as f64 / total, counts[1] as f64 / total],
    }
}

fn gini(counts: [usize; 2]) -> f64 {
    let total = (counts[0] + counts[1]) as f64;
    if total == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / total;
    let p1 = counts[1] as f64 / total;
    1.0 - p0 * p0 - p1 * p1
}

// Features are visited in random order; constant ones do not count towards
// `max_features`, and the search continues past it until a valid split exists.
fn best_split(
    x: &Array2<f64>,
    y: &[u8],
    samples: &[usize],
    counts: [usize; 2],
    params: &TreeParams,
    rng: &mut SmallRng,
) -> Option<Split> {
    let n_features = x.ncols();
    let max_features = params.max_features.clamp(1, n_features.max(1));
    let n = samples.len() as f64;
    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let mut ordered = samples.to_vec();
    let mut inspected = 0;
    let mut best: Option<(f64, Split)> = None;
    for feature in features {
        if inspected >= max_features && best.is_some() {
            break;
        }
        ordered.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));
        let first = x[[ordered[0], feature]];
        let last = x[[ordered[ordered.len() - 1], feature]];
        if first >= last {
            continue;
        }
        inspected += 1;

        let mut left = [0usize; 2];
        for pos in 0..ordered.len() - 1 {
            left[usize::from(y[ordered[pos]])] += 1;
            let current = x[[ordered[pos], feature]];
            let next = x[[ordered[pos + 1], feature]];
            if next <= current {
                continue;
            }
            let n_left = pos + 1;
            let n_right = ordered.len() - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }
            let right = [counts[0] - left[0], counts[1] - left[1]];
            let impurity = (n_left as f64).mul_add(gini(left), n_right as f64 * gini(right)) / n;
            if best.as_ref().map_or(true, |(score, _)| impurity < *score) {
                let mut threshold = current + (next - current) / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some((impurity, Split { feature, threshold }));
            }
        }
    }
    best.map(|(_, split)| split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separates_linearly_separable_rows() {
        let x = array![[0.1, 5.0], [0.2, 5.0], [0.8, 5.0], [0.9, 5.0]];
        let y = [0, 0, 1, 1];
        let mut rng = SmallRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3], &params(), &mut rng);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict_row(x.row(0)), [1.0, 0.0]);
        assert_eq!(tree.predict_row(x.row(3)), [0.0, 1.0]);
        assert_eq!(tree.predict_row(array![0.49, 0.0].view()), [1.0, 0.0]);
    }

    #[test]
    fn depth_limit_yields_mixed_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0, 1, 0, 1];
        let mut limited = params();
        limited.max_depth = Some(0);
        let mut rng = SmallRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3], &limited, &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(x.row(0)), [0.5, 0.5]);
    }

    #[test]
    fn identical_rows_cannot_split() {
        let x = array![[1.0, 1.0], [1.0, 1.0]];
        let y = [0, 1];
        let mut rng = SmallRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&x, &y, &[0, 1], &params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(x.row(0)), [0.5, 0.5]);
    }

    #[test]
    fn leaf_probabilities_sum_to_one() {
        let x = array![[0.0], [0.0], [0.0], [1.0]];
        let y = [0, 1, 1, 1];
        let mut rng = SmallRng::seed_from_u64(11);
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3], &params(), &mut rng);
        for row in x.outer_iter() {
            let p = tree.predict_row(row);
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
        }
    }
}
