use std::{fs, io::Cursor, path::Path};

use polars::prelude::*;

use crate::errors::PipelineError;

/// Loads the raw CSV dataset at `path` without transforming it.
///
/// A file that is empty (or whitespace only) yields an empty frame. A missing
/// file is [`PipelineError::Io`], an unparseable one [`PipelineError::SourceData`].
/// Rows ending in a trailing comma keep only the fields the header names.
pub fn load_raw_data(path: impl AsRef<Path>) -> Result<DataFrame, PipelineError> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(DataFrame::empty());
    }
    CsvReader::new(Cursor::new(raw))
        .has_header(true)
        .truncate_ragged_lines(true)
        .finish()
        .map_err(|source| PipelineError::SourceData {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_csv_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_data.csv");
        fs::write(&path, "col1,col2\n1,3\n2,4\n").unwrap();

        let df = load_raw_data(&path).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.get_column_names(), vec!["col1", "col2"]);
        let col2: Vec<Option<i64>> = df.column("col2").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(col2, vec![Some(3), Some(4)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_raw_data("non_existent_file.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn empty_file_yields_empty_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_data.csv");
        fs::write(&path, "").unwrap();
        let df = load_raw_data(&path).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn trailing_comma_rows_load_with_header_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "id,diagnosis,radius_mean,fractal_dimension_worst,\n\
             842302,M,17.99,0.1189,\n\
             842517,B,20.57,0.08902,\n",
        )
        .unwrap();
        let df = load_raw_data(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec!["id", "diagnosis", "radius_mean", "fractal_dimension_worst"]
        );
    }

    #[test]
    fn keeps_column_names_with_spaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spaces.csv");
        fs::write(&path, "id,diagnosis,concave points_mean\n1,M,0.14\n").unwrap();
        let df = load_raw_data(&path).unwrap();
        assert!(df.column("concave points_mean").is_ok());
        assert_eq!(df.column("diagnosis").unwrap().dtype(), &DataType::Utf8);
    }
}
