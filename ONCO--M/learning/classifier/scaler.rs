use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Per-feature min/max scaler mapping training data into [0, 1].
///
/// Constant features use a unit range, so they map to `x - min`. Values outside
/// the fitted range are not clipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// Learns per-column bounds. Refitting discards previous bounds.
    pub fn fit(&mut self, features: &Array2<f64>) -> Result<(), PipelineError> {
        if features.nrows() == 0 {
            return Err(PipelineError::EmptyOrMisaligned {
                features: 0,
                targets: 0,
            });
        }
        let (min, max): (Vec<f64>, Vec<f64>) = features
            .axis_iter(Axis(1))
            .map(|column| {
                column.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            })
            .unzip();
        self.min = min;
        self.max = max;
        Ok(())
    }

    /// Number of columns seen at fit time (0 when unfitted).
    #[must_use]
    pub fn width(&self) -> usize {
        self.min.len()
    }

    /// Fitted lower bounds.
    #[must_use]
    pub fn data_min(&self) -> &[f64] {
        &self.min
    }

    /// Fitted upper bounds.
    #[must_use]
    pub fn data_max(&self) -> &[f64] {
        &self.max
    }

    /// Applies the fitted bounds without refitting.
    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        if self.min.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        if features.ncols() != self.width() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.width(),
                found: features.ncols(),
            });
        }
        let mut scaled = features.clone();
        for (idx, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, hi) = (self.min[idx], self.max[idx]);
            let range = if hi - lo > 0.0 { hi - lo } else { 1.0 };
            column.mapv_inplace(|v| (v - lo) / range);
        }
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scales_training_data_into_unit_range() {
        let x = array![[1.0, 10.0], [3.0, 30.0], [2.0, 20.0]];
        let mut scaler = MinMaxScaler::default();
        scaler.fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        assert_eq!(scaled, array![[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]]);
        assert_eq!(scaler.data_min(), &[1.0, 10.0]);
        assert_eq!(scaler.data_max(), &[3.0, 30.0]);
    }

    #[test]
    fn constant_feature_does_not_divide_by_zero() {
        let x = array![[5.0], [5.0]];
        let mut scaler = MinMaxScaler::default();
        scaler.fit(&x).unwrap();
        let scaled = scaler.transform(&array![[5.0], [7.0]]).unwrap();
        assert_eq!(scaled, array![[0.0], [2.0]]);
    }

    #[test]
    fn unseen_values_are_not_clipped() {
        let mut scaler = MinMaxScaler::default();
        scaler.fit(&array![[0.0], [10.0]]).unwrap();
        let scaled = scaler.transform(&array![[20.0], [-5.0]]).unwrap();
        assert_eq!(scaled, array![[2.0], [-0.5]]);
    }

    #[test]
    fn rejects_unfitted_and_wrong_width() {
        let scaler = MinMaxScaler::default();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(PipelineError::NotFitted)
        ));
        let mut scaler = MinMaxScaler::default();
        scaler.fit(&array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(PipelineError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        ));
    }
}
