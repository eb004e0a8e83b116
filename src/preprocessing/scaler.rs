//! Feature standardization

use super::{float_series, float_values, replace_columns};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: f64,
    pub scale: f64,
}

/// Standard scaling (z-score normalization): (x - mean) / std
///
/// Statistics use the population standard deviation (ddof = 0) over the
/// non-missing values. A constant column keeps scale 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Create a new scaler
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params = columns
            .iter()
            .map(|name| {
                let values = float_values(df, name)?;
                Ok((name.clone(), Self::compute_params(&values)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements = self
            .params
            .iter()
            .map(|(name, params)| {
                let scaled: Vec<f64> = float_values(df, name)?
                    .into_iter()
                    .map(|v| (v - params.mean) / params.scale)
                    .collect();
                Ok(float_series(name, &scaled))
            })
            .collect::<Result<Vec<_>>>()?;

        replace_columns(df, replacements)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted parameters for a column
    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| *p)
    }

    fn compute_params(values: &[f64]) -> ScalerParams {
        let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if observed.is_empty() {
            return ScalerParams { mean: 0.0, scale: 1.0 };
        }

        let n = observed.len() as f64;
        let mean = observed.iter().sum::<f64>() / n;
        let var = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        ScalerParams {
            mean,
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }
}
