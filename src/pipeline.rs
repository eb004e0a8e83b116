//! End-to-end runs: preprocess only, or preprocess then train, evaluate,
//! persist and plot

use crate::config::Settings;
use crate::error::Result;
use crate::evaluation::evaluate;
use crate::export::{write_report, ModelArtifact};
use crate::preprocessing::{DataPreprocessor, PreprocessOutput};
use crate::training::TrainEngine;
use crate::visualization::ResultPlotter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What a training run produced
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub classes: Vec<String>,
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
    pub converged: bool,
    pub report: String,
    pub model_path: PathBuf,
    pub report_path: PathBuf,
    pub plot_paths: Vec<PathBuf>,
}

/// Load, clean and write the cleaned dataset
pub fn run_preprocess(settings: &Settings) -> Result<PreprocessOutput> {
    DataPreprocessor::new(settings).run()
}

/// Full training run driven by [`Settings`]
#[derive(Debug, Clone)]
pub struct ModelTrainer<'a> {
    settings: &'a Settings,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Preprocess, split, fit, evaluate, then write the model, the report
    /// and the plots. Nothing is written past the first failing step.
    pub fn run(&self) -> Result<TrainSummary> {
        let start = Instant::now();
        let settings = self.settings;

        let preprocessed = run_preprocess(settings)?;

        let engine = TrainEngine::from_settings(settings);
        engine.check_schema(&preprocessed.data)?;
        let plotter = ResultPlotter::new(
            engine.feature_columns().to_vec(),
            settings.plot_features.clone(),
        )?;

        let data = engine.prepare(&preprocessed.data)?;
        let model = engine.fit(&data)?;
        let evaluation = evaluate(&model, &data.x_val, &data.y_val)?;
        let report = evaluation.render_report();

        let model_path = settings.model_path();
        let artifact = ModelArtifact::new(
            model,
            preprocessed.transform,
            engine.feature_columns().to_vec(),
            engine.target_column(),
        )?;
        artifact.save(&model_path)?;

        let report_path = settings.report_output_path.clone();
        write_report(&report, &report_path)?;

        let plot_paths = plotter.plot(
            &artifact.classifier,
            &data.x_val,
            &evaluation,
            &settings.plot_dir(),
        )?;
        let headline = settings.headline_plot_path();
        if plot_paths.contains(&headline) {
            info!(path = %headline.display(), "Saved plot");
        } else {
            info!(path = %headline.display(), "Decision boundary plot saved");
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            accuracy = evaluation.accuracy(),
            "Training complete"
        );

        Ok(TrainSummary {
            rows_loaded: preprocessed.rows_loaded,
            duplicates_removed: preprocessed.duplicates_removed,
            train_rows: data.x_train.nrows(),
            validation_rows: data.x_val.nrows(),
            classes: data.classes,
            accuracy: evaluation.accuracy(),
            roc_auc: evaluation.roc_auc,
            converged: artifact.classifier.converged,
            report,
            model_path,
            report_path,
            plot_paths,
        })
    }
}
