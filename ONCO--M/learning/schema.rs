use std::borrow::Cow;

/// Identifier column carried by the source dataset.
pub const ID_COLUMN: &str = "id";

/// Empty trailing column produced by the source dataset's trailing comma.
pub const SPURIOUS_COLUMN: &str = "Unnamed: 32";

/// Diagnosis label / target column.
pub const DIAGNOSIS_COLUMN: &str = "diagnosis";

/// Label encoded as 1.
pub const MALIGNANT_LABEL: &str = "M";

/// Label encoded as 0.
pub const BENIGN_LABEL: &str = "B";

/// The ten base cell-nucleus measurements, in dataset order.
pub const BASE_MEASUREMENTS: [&str; 10] = [
    "radius",
    "texture",
    "perimeter",
    "area",
    "smoothness",
    "compactness",
    "concavity",
    "concave points",
    "symmetry",
    "fractal_dimension",
];

/// Statistic suffixes, in dataset order.
pub const STATISTICS: [&str; 3] = ["mean", "se", "worst"];

/// Number of features in the fixed schema.
pub const FEATURE_COUNT: usize = BASE_MEASUREMENTS.len() * STATISTICS.len();

/// Returns the 30 feature display names in dataset order (all `_mean`, then `_se`, then `_worst`).
#[must_use]
pub fn feature_names() -> Vec<String> {
    STATISTICS
        .iter()
        .flat_map(|stat| {
            BASE_MEASUREMENTS
                .iter()
                .map(move |base| format!("{base}_{stat}"))
        })
        .collect()
}

/// Resolves internal identifiers (`concave_points_mean`) to display names
/// (`concave points_mean`). Unknown names pass through untouched.
#[must_use]
pub fn canonical_feature_name(name: &str) -> Cow<'_, str> {
    for stat in STATISTICS {
        let Some(base) = name
            .strip_suffix(stat)
            .and_then(|rest| rest.strip_suffix('_'))
        else {
            continue;
        };
        if base.contains(' ') {
            return Cow::Borrowed(name);
        }
        if let Some(display) = BASE_MEASUREMENTS
            .iter()
            .find(|candidate| candidate.contains(' ') && candidate.replace(' ', "_") == base)
        {
            return Cow::Owned(format!("{display}_{stat}"));
        }
    }
    Cow::Borrowed(name)
}
