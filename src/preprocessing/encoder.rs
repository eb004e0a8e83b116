//! Target label encoding

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Maps class labels to contiguous indices in ascending label order.
///
/// Labels that all parse as numbers are ordered numerically, otherwise
/// lexicographically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    is_fitted: bool,
}

impl LabelEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a target column as string labels; a missing label is an error
    pub fn labels_from_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::missing_column(name))?;
        let series = column
            .as_materialized_series()
            .cast(&DataType::String)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        let ca = series
            .str()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        ca.into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(str::to_string).ok_or_else(|| {
                    PipelineError::DataError(format!("Missing label in '{}' at row {}", name, row))
                })
            })
            .collect()
    }

    /// Learn the sorted set of distinct labels
    pub fn fit(&mut self, labels: &[String]) -> &mut Self {
        let mut classes: Vec<String> = labels.to_vec();
        let numeric = classes.iter().all(|c| c.parse::<f64>().is_ok());
        classes.sort_by(|a, b| compare_labels(a, b, numeric));
        classes.dedup();

        self.classes = classes;
        self.is_fitted = true;
        self
    }

    /// Encode labels as class indices
    pub fn transform(&self, labels: &[String]) -> Result<Array1<usize>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let index: HashMap<&str, usize> = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        labels
            .iter()
            .map(|label| {
                index
                    .get(label.as_str())
                    .copied()
                    .ok_or_else(|| PipelineError::DataError(format!("Unknown label '{}'", label)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Array1::from)
    }

    /// Fit and encode in one step
    pub fn fit_transform(&mut self, labels: &[String]) -> Result<Array1<usize>> {
        self.fit(labels);
        self.transform(labels)
    }

    /// Class labels in index order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

fn compare_labels(a: &str, b: &str, numeric: bool) -> Ordering {
    if numeric {
        let x = a.parse::<f64>().unwrap_or(f64::NAN);
        let y = b.parse::<f64>().unwrap_or(f64::NAN);
        x.total_cmp(&y).then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_numeric_labels_sorted_numerically() {
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&labels(&["10", "2", "1", "2"])).unwrap();

        assert_eq!(encoder.classes(), &["1", "2", "10"]);
        assert_eq!(encoded.to_vec(), vec![2, 1, 0, 1]);
    }

    #[test]
    fn test_string_labels_sorted_lexicographically() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&labels(&["setosa", "virginica", "versicolor"]));
        assert_eq!(encoder.classes(), &["setosa", "versicolor", "virginica"]);
    }

    #[test]
    fn test_unknown_label() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&labels(&["a", "b"]));
        assert!(encoder.transform(&labels(&["c"])).is_err());
    }

    #[test]
    fn test_labels_from_integer_column() {
        let df = df!("y" => &[0i64, 1, 1]).unwrap();
        let ys = LabelEncoder::labels_from_column(&df, "y").unwrap();
        assert_eq!(ys, labels(&["0", "1", "1"]));
    }

    #[test]
    fn test_null_label_rejected() {
        let df = df!("y" => &[Some("a"), None]).unwrap();
        let err = LabelEncoder::labels_from_column(&df, "y").unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }
}
