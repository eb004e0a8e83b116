//! Missing value imputation

use super::{float_series, float_values, replace_columns};
use crate::error::{PipelineError, Result};
use crate::utils::median;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column-wise median imputer for numeric columns.
///
/// Null and NaN are both treated as missing. A column with no observed
/// values has no fill value and is left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    fill_values: Vec<(String, Option<f64>)>,
    is_fitted: bool,
}

impl Default for Imputer {
    fn default() -> Self {
        Self::new()
    }
}

impl Imputer {
    /// Create a new imputer
    pub fn new() -> Self {
        Self {
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn fill values for `columns`
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.fill_values = columns
            .iter()
            .map(|name| {
                let values = float_values(df, name)?;
                Ok((name.clone(), median(&values)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Fill missing entries of the fitted columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements = self
            .fill_values
            .iter()
            .map(|(name, fill)| {
                let values = float_values(df, name)?;
                let filled: Vec<f64> = match fill {
                    Some(f) => values
                        .into_iter()
                        .map(|v| if v.is_nan() { *f } else { v })
                        .collect(),
                    None => values,
                };
                Ok(float_series(name, &filled))
            })
            .collect::<Result<Vec<_>>>()?;

        replace_columns(df, replacements)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for a column, if the column was fitted and had data
    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, fill)| *fill)
    }
}
