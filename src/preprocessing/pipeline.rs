//! Preprocessing run: load, clean and persist the cleaned dataset

use super::{Cleaner, NumericTransform};
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of a preprocessing run
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// Cleaned dataset
    pub data: DataFrame,
    /// Transform fitted on the cleaned dataset
    pub transform: NumericTransform,
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    /// Where the cleaned CSV was written
    pub output_path: PathBuf,
}

/// Loader + Cleaner + writer of the cleaned dataset
#[derive(Debug, Clone)]
pub struct DataPreprocessor {
    input_path: PathBuf,
    output_path: PathBuf,
    loader: DataLoader,
    cleaner: Cleaner,
}

impl DataPreprocessor {
    /// Build from settings
    pub fn new(settings: &Settings) -> Self {
        Self {
            input_path: settings.unprocessed_data_path.clone(),
            output_path: settings.processed_data_path.clone(),
            loader: DataLoader::new(),
            cleaner: Cleaner::from_settings(settings),
        }
    }

    /// Load the raw dataset
    pub fn load(&self) -> Result<DataFrame> {
        let df = self.loader.load_csv(&self.input_path)?;
        info!(
            path = %self.input_path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );
        Ok(df)
    }

    /// Clean a loaded dataset
    pub fn clean(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.cleaner.clean(df)
    }

    /// Write the cleaned dataset as CSV
    pub fn save(&self, df: &mut DataFrame) -> Result<()> {
        DataSaver::save_csv(df, &self.output_path)?;
        info!(path = %self.output_path.display(), rows = df.height(), "Saved cleaned dataset");
        Ok(())
    }

    /// Run load, clean and save
    pub fn run(mut self) -> Result<PreprocessOutput> {
        let start = Instant::now();

        let raw = self.load()?;
        let rows_loaded = raw.height();
        let mut data = self.clean(&raw)?;
        self.save(&mut data)?;

        let duplicates_removed = self.cleaner.duplicates_removed();
        let transform = self
            .cleaner
            .into_transform()
            .ok_or(PipelineError::ModelNotFitted)?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessing complete"
        );

        Ok(PreprocessOutput {
            data,
            transform,
            rows_loaded,
            duplicates_removed,
            output_path: self.output_path,
        })
    }
}
