//! Utility functions and types

pub mod data_loader;

pub use data_loader::{ensure_parent_dir, DataLoader, DataSaver};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Missing values become NaN so downstream fitting can reject them.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::missing_column(col_name.clone()))?;
            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            let values: Vec<f64> = series
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Median of a slice, ignoring NaN. `None` when no finite value exists.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

/// Per-column medians of a matrix
pub fn column_medians(x: &Array2<f64>) -> Array1<f64> {
    Array1::from_iter(x.columns().into_iter().map(|col| {
        let values: Vec<f64> = col.iter().copied().collect();
        median(&values).unwrap_or(f64::NAN)
    }))
}

/// `n` evenly spaced values over `[start, stop]`
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
