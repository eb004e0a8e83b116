//! Training engine: feature extraction, stratified split and model fitting

use super::linear_models::LogisticRegression;
use super::split::{SplitIndices, StratifiedSplitter};
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::preprocessing::LabelEncoder;
use crate::utils::columns_to_array2;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::time::Instant;
use tracing::info;

/// Features and labels split into train and validation partitions
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub y_train: Array1<usize>,
    pub x_val: Array2<f64>,
    pub y_val: Array1<usize>,
    /// Class labels in index order
    pub classes: Vec<String>,
    pub split: SplitIndices,
}

impl PreparedData {
    /// Training labels as class names
    pub fn train_labels(&self) -> Vec<String> {
        self.y_train.iter().map(|&i| self.classes[i].clone()).collect()
    }
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    feature_columns: Vec<String>,
    target_column: String,
    test_size: f64,
    random_state: u64,
    max_iter: usize,
    c: f64,
}

impl TrainEngine {
    /// Create a training engine over `feature_columns` predicting `target_column`
    pub fn new(feature_columns: Vec<String>, target_column: impl Into<String>) -> Self {
        Self {
            feature_columns,
            target_column: target_column.into(),
            test_size: 0.2,
            random_state: 0,
            max_iter: 100,
            c: 1.0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.num_cols.clone(), settings.target_col.clone())
            .with_test_size(settings.test_size)
            .with_random_state(settings.random_state)
            .with_max_iter(settings.max_iter)
            .with_c(settings.inverse_regularization)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Check that the target and every feature column are present
    pub fn check_schema(&self, df: &DataFrame) -> Result<()> {
        let missing: Vec<String> = std::iter::once(&self.target_column)
            .chain(self.feature_columns.iter())
            .filter(|c| df.column(c.as_str()).is_err())
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::SchemaError { missing })
        }
    }

    /// Extract features and labels and split them
    pub fn prepare(&self, df: &DataFrame) -> Result<PreparedData> {
        self.check_schema(df)?;

        let x = columns_to_array2(df, &self.feature_columns)?;
        let labels = LabelEncoder::labels_from_column(df, &self.target_column)?;
        let mut encoder = LabelEncoder::new();
        let y = encoder.fit_transform(&labels)?;

        let split = StratifiedSplitter::new(self.test_size, self.random_state)?.split(&y)?;
        let (x_train, y_train, x_val, y_val) = split.apply(&x, &y);

        info!(
            train_rows = x_train.nrows(),
            validation_rows = x_val.nrows(),
            classes = encoder.classes().len(),
            "Split dataset"
        );

        Ok(PreparedData {
            x_train,
            y_train,
            x_val,
            y_val,
            classes: encoder.classes().to_vec(),
            split,
        })
    }

    /// Fit a logistic regression on the training partition
    pub fn fit(&self, data: &PreparedData) -> Result<LogisticRegression> {
        let start = Instant::now();

        let mut model = LogisticRegression::new()
            .with_c(self.c)
            .with_max_iter(self.max_iter);
        model.fit(&data.x_train, &data.train_labels())?;

        if model.classes != data.classes {
            return Err(PipelineError::DataError(format!(
                "training partition classes {:?} differ from dataset classes {:?}",
                model.classes, data.classes
            )));
        }

        info!(
            n_iter = model.n_iter,
            converged = model.converged,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained"
        );
        Ok(model)
    }
}
