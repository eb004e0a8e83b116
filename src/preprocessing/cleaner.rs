//! Dataset cleaning: deduplication, column removal and numeric feature transforms

use super::{missing_count, Imputer, StandardScaler, Transformer};
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Fitted numeric feature transform: median imputation, then log1p, then
/// standardization, learned on one dataset and replayable on another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTransform {
    columns: Vec<String>,
    imputer: Imputer,
    transformer: Transformer,
    scaler: StandardScaler,
    is_fitted: bool,
}

impl NumericTransform {
    /// Create an unfitted transform over `columns`
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            imputer: Imputer::new(),
            transformer: Transformer::new(),
            scaler: StandardScaler::new(),
            is_fitted: false,
        }
    }

    /// Learn statistics from `df` and return the transformed frame
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let imputed = self.imputer.fit_transform(df, &self.columns)?;
        let logged = self.transformer.fit_transform(&imputed, &self.columns)?;
        let scaled = self.scaler.fit_transform(&logged, &self.columns)?;
        self.is_fitted = true;
        Ok(scaled)
    }

    /// Apply the learned statistics
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let imputed = self.imputer.transform(df)?;
        let logged = self.transformer.transform(&imputed)?;
        self.scaler.transform(&logged)
    }

    /// Columns the transform applies to, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fitted imputer
    pub fn imputer(&self) -> &Imputer {
        &self.imputer
    }

    /// Fitted scaler
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

/// Cleans a loaded dataset in a fixed order: dedup, drop, transform, check.
#[derive(Debug, Clone)]
pub struct Cleaner {
    drop_cols: Vec<String>,
    num_cols: Vec<String>,
    transform: Option<NumericTransform>,
    duplicates_removed: usize,
}

impl Cleaner {
    /// Create a cleaner; identifier and noise columns are both removed
    pub fn new(drop_cols: &[String], noise_cols: &[String], num_cols: &[String]) -> Self {
        let drop_cols = drop_cols.iter().chain(noise_cols.iter()).cloned().collect();
        Self {
            drop_cols,
            num_cols: num_cols.to_vec(),
            transform: None,
            duplicates_removed: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.drop_cols, &settings.noise_cols, &settings.num_cols)
    }

    /// Clean `df`, fitting a fresh numeric transform on it
    pub fn clean(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let (deduped, removed) = drop_duplicates(df)?;
        self.duplicates_removed = removed;
        info!(
            duplicates_removed = removed,
            rows = deduped.height(),
            "Removed duplicate rows"
        );

        let reduced = drop_columns(&deduped, &self.drop_cols)?;
        debug!(columns = reduced.width(), "Dropped identifier and noise columns");

        let missing: Vec<String> = self
            .num_cols
            .iter()
            .filter(|c| reduced.column(c.as_str()).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::SchemaError { missing });
        }

        let mut transform = NumericTransform::new(self.num_cols.clone());
        let cleaned = transform.fit_transform(&reduced)?;
        self.transform = Some(transform);

        let mut residual = Vec::new();
        for name in &self.num_cols {
            if missing_count(&cleaned, name)? > 0 {
                residual.push(name.clone());
            }
        }
        if residual.is_empty() {
            info!(numeric_columns = self.num_cols.len(), "Numeric features transformed");
        } else {
            warn!(
                columns = ?residual,
                "Missing values remain in numeric columns after cleaning"
            );
        }

        Ok(cleaned)
    }

    /// Transform fitted by the last `clean` call
    pub fn transform(&self) -> Option<&NumericTransform> {
        self.transform.as_ref()
    }

    pub fn into_transform(self) -> Option<NumericTransform> {
        self.transform
    }

    /// Rows removed as duplicates by the last `clean` call
    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }
}

/// Remove exact-duplicate rows, keeping the first occurrence in order.
/// Returns the deduplicated frame and the number of rows removed.
pub fn drop_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let columns: Vec<Vec<Option<String>>> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let series = if series.dtype().is_float() {
                unsigned_zero(series)?
            } else {
                series.clone()
            };
            let series = series
                .cast(&DataType::String)
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            let ca = series
                .str()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = (0..df.height())
        .map(|row| {
            let key: Vec<Option<String>> = columns.iter().map(|c| c[row].clone()).collect();
            seen.insert(key)
        })
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok((df.clone(), 0));
    }

    let mask: BooleanChunked = keep.into_iter().collect();
    let filtered = df
        .filter(&mask)
        .map_err(|e| PipelineError::DataError(e.to_string()))?;
    Ok((filtered, removed))
}

/// Float column with -0.0 rewritten as 0.0 so both render alike
fn unsigned_zero(series: &Series) -> Result<Series> {
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| PipelineError::DataError(e.to_string()))?;
    let values = cast
        .f64()
        .map_err(|e| PipelineError::DataError(e.to_string()))?;
    let normalized: Float64Chunked = values
        .into_iter()
        .map(|v| v.map(|x| if x == 0.0 { 0.0 } else { x }))
        .collect();
    Ok(normalized.with_name(series.name().clone()).into_series())
}

/// Drop the named columns, ignoring any that are absent
pub fn drop_columns(df: &DataFrame, names: &[String]) -> Result<DataFrame> {
    let mut result = df.clone();
    for name in names {
        if result.column(name).is_ok() {
            result = result
                .drop(name)
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
        }
    }
    Ok(result)
}
