//! Delimited data loading and saving

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loader for comma-separated files with a header line
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a loader that infers column types from every row
    pub fn new() -> Self {
        Self
    }

    /// Load a delimited file; one record per non-header row.
    ///
    /// The path is checked before parsing so a missing input surfaces as
    /// [`PipelineError::NotFound`] rather than a parse failure.
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.is_file() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|_| PipelineError::NotFound {
            path: path.to_path_buf(),
        })?;

        let parse_opts = CsvParseOptions::default().with_separator(b',');

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

/// Writer for cleaned datasets
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header line, creating parent directories as needed
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| PipelineError::DataError(e.to_string()))
    }
}

/// Create the parent directory of `path` if it has one
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let loader = DataLoader::new();
        let err = loader.load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn test_load_csv_rows_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "id,age,city\n1,25,NYC\n2,,LA\n3,40,SF\n").unwrap();

        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_save_csv_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let mut df = df!("a" => &[1.0, 2.0], "b" => &["x", "y"]).unwrap();

        DataSaver::save_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("a,b"));
        assert_eq!(text.lines().count(), 3);
    }
}
