//! Element-wise feature transformations

use super::{float_series, float_values, replace_columns};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// ln(1 + x) applied to a fixed set of columns.
///
/// Inputs below -1 map to NaN and -1 maps to -inf, matching `f64::ln_1p`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    columns: Vec<String>,
    is_fitted: bool,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer {
    /// Create a new transformer
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Record the columns to transform
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            if df.column(name).is_err() {
                return Err(PipelineError::missing_column(name.clone()));
            }
        }
        self.columns = columns.to_vec();
        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the transformation to every fitted column
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements = self
            .columns
            .iter()
            .map(|name| {
                let values: Vec<f64> = float_values(df, name)?
                    .into_iter()
                    .map(f64::ln_1p)
                    .collect();
                Ok(float_series(name, &values))
            })
            .collect::<Result<Vec<_>>>()?;

        replace_columns(df, replacements)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}
