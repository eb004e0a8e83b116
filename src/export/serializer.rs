//! Model artifact persistence

use crate::error::{PipelineError, Result};
use crate::preprocessing::NumericTransform;
use crate::training::LogisticRegression;
use crate::utils::ensure_parent_dir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Everything needed to score new rows: the fitted classifier, the fitted
/// numeric transform, and the column layout it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub classifier: LogisticRegression,
    pub transform: NumericTransform,
    pub feature_columns: Vec<String>,
    pub target_column: String,
    pub created_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(
        classifier: LogisticRegression,
        transform: NumericTransform,
        feature_columns: Vec<String>,
        target_column: impl Into<String>,
    ) -> Result<Self> {
        if !classifier.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        Ok(Self {
            classifier,
            transform,
            feature_columns,
            target_column: target_column.into(),
            created_at: Utc::now(),
        })
    }

    /// Serialize to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        info!(path = %path.display(), "Saved model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Write report text to `path`, creating parent directories
pub fn write_report(text: &str, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, text)?;
    info!(path = %path.display(), "Saved classification report");
    Ok(())
}
