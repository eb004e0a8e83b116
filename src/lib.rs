//! tabclass - Tabular cleaning and linear classification
//!
//! This crate loads a delimited dataset, cleans it, fits a
//! logistic-regression classifier on a stratified split and writes:
//! - the cleaned dataset as CSV
//! - the fitted model with its preprocessing transform
//! - a per-class classification report
//! - decision boundary, confusion matrix, ROC and precision-recall plots
//!
//! # Modules
//!
//! - [`config`] - Settings from a TOML file and the environment
//! - [`preprocessing`] - Deduplication, column removal, impute/log1p/standardize
//! - [`training`] - Stratified split, L-BFGS, logistic regression
//! - [`evaluation`] - Confusion matrix, classification report, ROC/PR curves
//! - [`visualization`] - PNG plots
//! - [`export`] - Model artifact and report persistence
//! - [`pipeline`] - Preprocess and train runs
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod evaluation;

// Output
pub mod visualization;
pub mod export;

// Orchestration
pub mod pipeline;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Configuration
    pub use crate::config::Settings;

    // Preprocessing
    pub use crate::preprocessing::{Cleaner, DataPreprocessor, NumericTransform, PreprocessOutput};

    // Training
    pub use crate::training::{Classifier, LogisticRegression, StratifiedSplitter, TrainEngine};

    // Evaluation
    pub use crate::evaluation::{evaluate, ClassificationReport, Evaluation, EvaluationStrategy};

    // Output
    pub use crate::export::ModelArtifact;
    pub use crate::visualization::ResultPlotter;

    // Runs
    pub use crate::pipeline::{run_preprocess, ModelTrainer, TrainSummary};
}
