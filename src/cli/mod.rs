//! tabclass CLI Module
//!
//! Command-line interface for the preprocessing and training runs.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Settings;
use crate::pipeline::{run_preprocess, ModelTrainer};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn kv(key: &str, val: &str) {
    println!("  {:<20} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable lines
    Pretty,
}

#[derive(Parser)]
#[command(name = "tabclass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clean a tabular dataset and train a logistic-regression classifier")]
#[command(long_about = None)]
pub struct Cli {
    /// TOML settings file; environment variables override its values
    #[arg(long, global = true, env = "TABCLASS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Load, clean and write the cleaned dataset
    Preprocess,
    /// Preprocess, then fit, evaluate, persist and plot
    Train,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_preprocess(settings: &Settings) -> anyhow::Result<()> {
    let start = Instant::now();
    let output = run_preprocess(settings)?;

    section("Preprocess");
    step_ok(&format!(
        "{} rows loaded, {} duplicates removed",
        output.rows_loaded, output.duplicates_removed
    ));
    kv("Rows", &output.data.height().to_string());
    kv("Columns", &output.data.width().to_string());
    kv("Output", &output.output_path.display().to_string());
    kv("Time", &format!("{:.3}s", start.elapsed().as_secs_f64()));
    println!();
    Ok(())
}

pub fn cmd_train(settings: &Settings) -> anyhow::Result<()> {
    let start = Instant::now();
    let summary = ModelTrainer::new(settings).run()?;

    section("Train");
    step_ok(&format!(
        "{} train / {} validation rows, {} classes",
        summary.train_rows,
        summary.validation_rows,
        summary.classes.len()
    ));
    if !summary.converged {
        println!("  {} optimizer stopped at max_iter", "!".yellow());
    }
    kv("Accuracy", &format!("{:.4}", summary.accuracy));
    if let Some(auc) = summary.roc_auc {
        kv("ROC-AUC", &format!("{:.4}", auc));
    }
    kv("Model", &summary.model_path.display().to_string());
    kv("Report", &summary.report_path.display().to_string());
    for path in &summary.plot_paths {
        kv("Plot", &path.display().to_string());
    }
    kv("Time", &format!("{:.3}s", start.elapsed().as_secs_f64()));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_train_with_options() {
        let cli = Cli::try_parse_from([
            "tabclass",
            "--config",
            "settings.toml",
            "--log-format",
            "pretty",
            "train",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Train));
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_eq!(cli.config, Some(PathBuf::from("settings.toml")));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["tabclass", "serve"]).is_err());
    }
}
