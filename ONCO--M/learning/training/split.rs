use polars::prelude::*;
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use crate::errors::PipelineError;

/// Train/test partition of a feature frame and its target.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Rows used for fitting.
    pub train_features: DataFrame,
    /// Held-out rows.
    pub test_features: DataFrame,
    /// Target for `train_features`.
    pub train_target: Series,
    /// Target for `test_features`.
    pub test_target: Series,
}

/// Number of held-out rows: `ceil(rows * ratio)`, keeping at least one row on each side.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn test_size(rows: usize, ratio: f64) -> usize {
    let raw = (rows as f64 * ratio).ceil() as usize;
    raw.clamp(1, rows.saturating_sub(1).max(1))
}

/// Shuffles row indices with `seed` and holds out the first [`test_size`] of them.
pub fn train_test_split(
    features: &DataFrame,
    target: &Series,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit, PipelineError> {
    let rows = features.height();
    if rows < 2 || rows != target.len() {
        return Err(PipelineError::EmptyOrMisaligned {
            features: rows,
            targets: target.len(),
        });
    }
    let mut order: Vec<IdxSize> = (0..rows as IdxSize).collect();
    order.shuffle(&mut SmallRng::seed_from_u64(seed));
    let (test, train) = order.split_at(test_size(rows, test_ratio));
    let train_idx = IdxCa::from_vec("train", train.to_vec());
    let test_idx = IdxCa::from_vec("test", test.to_vec());
    Ok(TrainTestSplit {
        train_features: features.take(&train_idx)?,
        test_features: features.take(&test_idx)?,
        train_target: target.take(&train_idx)?,
        test_target: target.take(&test_idx)?,
    })
}

/// Fraction of positions where both label slices agree; 0 for empty input.
#[must_use]
pub fn accuracy(predicted: &[u8], expected: &[u8]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = predicted
        .iter()
        .zip(expected)
        .filter(|(left, right)| left == right)
        .count();
    hits as f64 / expected.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::tests::values;

    fn frame(rows: usize) -> (DataFrame, Series) {
        let ids: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        let labels: Vec<f64> = (0..rows).map(|i| (i % 2) as f64).collect();
        (
            DataFrame::new(vec![Series::new("radius_mean", ids)]).unwrap(),
            Series::new("diagnosis", labels),
        )
    }

    #[test]
    fn eighty_twenty_with_ceiling() {
        assert_eq!(test_size(10, 0.2), 2);
        assert_eq!(test_size(11, 0.2), 3);
        assert_eq!(test_size(569, 0.2), 114);
        assert_eq!(test_size(2, 0.2), 1);
    }

    #[test]
    fn split_is_a_seeded_partition() {
        let (features, target) = frame(10);
        let split = train_test_split(&features, &target, 0.2, 42).unwrap();
        assert_eq!(split.train_features.height(), 8);
        assert_eq!(split.test_features.height(), 2);
        assert_eq!(split.train_target.len(), 8);

        let mut seen: Vec<f64> = values(split.train_features.column("radius_mean").unwrap())
            .into_iter()
            .chain(values(split.test_features.column("radius_mean").unwrap()))
            .flatten()
            .collect();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, (0..10).map(f64::from).collect::<Vec<_>>());

        let train_ids = values(split.train_features.column("radius_mean").unwrap());
        let train_labels = values(&split.train_target);
        for (id, label) in train_ids.iter().zip(&train_labels) {
            assert_eq!(id.map(|v| v % 2.0), *label);
        }

        let again = train_test_split(&features, &target, 0.2, 42).unwrap();
        assert_eq!(
            values(again.test_features.column("radius_mean").unwrap()),
            values(split.test_features.column("radius_mean").unwrap())
        );
    }

    #[test]
    fn too_few_rows_fail() {
        let (features, target) = frame(1);
        assert!(matches!(
            train_test_split(&features, &target, 0.2, 42),
            Err(PipelineError::EmptyOrMisaligned { .. })
        ));
    }

    #[test]
    fn accuracy_counts_matches() {
        assert!((accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]) - 0.75).abs() < f64::EPSILON);
        assert!(accuracy(&[], &[]).abs() < f64::EPSILON);
    }
}
