//! Data preprocessing module
//!
//! Cleaning of a loaded dataset before modeling:
//! - Exact-duplicate row removal
//! - Identifier / noise column removal
//! - Median imputation, log1p and standardization of numeric features
//! - Label encoding of the target column

mod cleaner;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;
pub mod transforms;

pub use cleaner::{drop_columns, drop_duplicates, Cleaner, NumericTransform};
pub use encoder::LabelEncoder;
pub use imputer::Imputer;
pub use pipeline::{DataPreprocessor, PreprocessOutput};
pub use scaler::StandardScaler;
pub use transforms::Transformer;

use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Read a column as `f64` values, with null mapped to NaN
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(name))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| PipelineError::DataError(e.to_string()))?;
    let ca = series
        .f64()
        .map_err(|e| PipelineError::DataError(e.to_string()))?;

    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Build a Float64 series, writing NaN back out as null
pub(crate) fn float_series(name: &str, values: &[f64]) -> Series {
    let ca: Float64Chunked = values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(v) })
        .collect();
    ca.with_name(name.into()).into_series()
}

/// Replace columns of `df` with the given series in one pass
pub(crate) fn replace_columns(df: &DataFrame, replacements: Vec<Series>) -> Result<DataFrame> {
    let mut result = df.clone();
    for series in replacements {
        result
            .with_column(series)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
    }
    Ok(result)
}

/// Number of null or NaN entries in a numeric column
pub(crate) fn missing_count(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(float_values(df, name)?.iter().filter(|v| v.is_nan()).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_values_casts_integers_and_nulls() {
        let df = df!("a" => &[Some(1i64), None, Some(3)]).unwrap();
        let values = float_values(&df, "a").unwrap();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }

    #[test]
    fn test_float_series_writes_nan_as_null() {
        let s = float_series("x", &[1.0, f64::NAN]);
        assert_eq!(s.null_count(), 1);
        assert_eq!(s.name().as_str(), "x");
    }

    #[test]
    fn test_missing_count() {
        let df = df!("a" => &[Some(1.0), None, Some(f64::NAN)]).unwrap();
        assert_eq!(missing_count(&df, "a").unwrap(), 2);
    }
}
