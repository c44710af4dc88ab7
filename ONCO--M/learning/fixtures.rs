use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use polars::prelude::*;

use crate::{
    preprocessing::{map_diagnosis_to_numerical, prepare_features_and_target},
    schema::feature_names,
};

const DUMMY_MEAN_RAMPS: [(f64, f64); 10] = [
    (10.0, 1.0),
    (15.0, 1.0),
    (70.0, 1.0),
    (300.0, 1.0),
    (0.1, 0.01),
    (0.05, 0.005),
    (0.03, 0.003),
    (0.01, 0.001),
    (0.15, 0.005),
    (0.05, 0.001),
];

/// Feature values of row `i` of [`dummy_csv`], in schema order.
pub(crate) fn dummy_row(i: u32) -> Vec<(String, f64)> {
    let step = f64::from(i);
    let names = feature_names();
    let values = DUMMY_MEAN_RAMPS
        .iter()
        .map(|(start, delta)| start + step * delta)
        .chain(std::iter::repeat(0.1 + step * 0.001));
    names.into_iter().zip(values).collect()
}

/// Ten alternating M/B rows; `_mean` columns climb per row, `_se`/`_worst` share one ramp.
pub(crate) fn dummy_csv() -> String {
    let mut csv = format!("id,diagnosis,{}\n", feature_names().join(","));
    for i in 0..10u32 {
        let label = if i % 2 == 0 { "M" } else { "B" };
        let _ = write!(csv, "{i},{label}");
        for (_, value) in dummy_row(i) {
            let _ = write!(csv, ",{value}");
        }
        csv.push('\n');
    }
    csv
}

pub(crate) fn write_dummy_csv(dir: &Path) -> PathBuf {
    let path = dir.join("dummy_data.csv");
    fs::write(&path, dummy_csv()).unwrap();
    path
}

/// Raw frame whose malignant rows are three times larger on every feature.
pub(crate) fn separable_frame(rows: usize) -> DataFrame {
    let labels: Vec<&str> = (0..rows)
        .map(|i| if i % 2 == 0 { "M" } else { "B" })
        .collect();
    let ids: Vec<i64> = (0..rows as i64).collect();
    let mut columns = vec![Series::new("id", ids), Series::new("diagnosis", labels)];
    for (k, name) in feature_names().iter().enumerate() {
        let base = 1.0 + k as f64 * 0.1;
        let values: Vec<f64> = (0..rows)
            .map(|i| {
                let jitter = i as f64 * 0.001;
                if i % 2 == 0 {
                    base.mul_add(3.0, jitter)
                } else {
                    base + jitter
                }
            })
            .collect();
        columns.push(Series::new(name, values));
    }
    columns.push(Series::full_null("Unnamed: 32", rows, &DataType::Float64));
    DataFrame::new(columns).unwrap()
}

pub(crate) fn separable_features_and_target(rows: usize) -> (DataFrame, Series) {
    let encoded = map_diagnosis_to_numerical(separable_frame(rows)).unwrap();
    prepare_features_and_target(&encoded).unwrap()
}

/// Writes the separable rows in the published dataset layout: header and
/// every row end with a trailing comma.
pub(crate) fn write_separable_csv(dir: &Path, rows: usize) -> PathBuf {
    let names = feature_names();
    let mut csv = format!("id,diagnosis,{},\n", names.join(","));
    for i in 0..rows {
        let malignant = i % 2 == 0;
        let _ = write!(csv, "{i},{}", if malignant { "M" } else { "B" });
        for k in 0..names.len() {
            let base = 1.0 + k as f64 * 0.1;
            let value = if malignant { base * 3.0 } else { base } + i as f64 * 0.001;
            let _ = write!(csv, ",{value}");
        }
        csv.push_str(",\n");
    }
    let path = dir.join("separable.csv");
    fs::write(&path, csv).unwrap();
    path
}

/// A malignant-looking sample keyed by display names.
pub(crate) const SAMPLE_ROW: [(&str, f64); 30] = [
    ("radius_mean", 17.99),
    ("texture_mean", 10.38),
    ("perimeter_mean", 122.8),
    ("area_mean", 1001.0),
    ("smoothness_mean", 0.1184),
    ("compactness_mean", 0.2776),
    ("concavity_mean", 0.3001),
    ("concave points_mean", 0.1471),
    ("symmetry_mean", 0.2419),
    ("fractal_dimension_mean", 0.07871),
    ("radius_se", 1.095),
    ("texture_se", 0.9053),
    ("perimeter_se", 8.589),
    ("area_se", 153.4),
    ("smoothness_se", 0.006399),
    ("compactness_se", 0.04904),
    ("concavity_se", 0.05373),
    ("concave points_se", 0.01587),
    ("symmetry_se", 0.03003),
    ("fractal_dimension_se", 0.006193),
    ("radius_worst", 25.38),
    ("texture_worst", 17.33),
    ("perimeter_worst", 184.6),
    ("area_worst", 2019.0),
    ("smoothness_worst", 0.1622),
    ("compactness_worst", 0.6656),
    ("concavity_worst", 0.7119),
    ("concave points_worst", 0.2654),
    ("symmetry_worst", 0.4601),
    ("fractal_dimension_worst", 0.1189),
];
