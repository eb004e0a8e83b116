//! Pipeline settings
//!
//! Settings are assembled once at startup from an optional TOML file overlaid by
//! environment variables, validated, and then handed to each component by reference.
//! Environment variable names are the option names in upper case
//! (`TARGET_COL`, `DROP_COLS`, ...). List options accept a JSON array or a
//! comma-separated string when they come from the environment.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File names of the four diagnostic images written by the plotter
pub const PLOT_FILE_NAMES: [&str; 4] = [
    "decision_boundary.png",
    "confusion_matrix.png",
    "roc_curve.png",
    "precision_recall_curve.png",
];

const REQUIRED_OPTIONS: [&str; 14] = [
    "unprocessed_data_path",
    "processed_data_path",
    "model_output_path",
    "report_output_path",
    "model_filename",
    "plot_filename",
    "test_size",
    "random_state",
    "max_iter",
    "drop_cols",
    "noise_cols",
    "num_cols",
    "target_col",
    "plot_features",
];

const OPTIONAL_OPTIONS: [&str; 2] = ["plot_output_path", "inverse_regularization"];

/// Typed, validated pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Raw delimited input file
    pub unprocessed_data_path: PathBuf,
    /// Where the cleaned dataset is written
    pub processed_data_path: PathBuf,
    /// Directory receiving the serialized model
    pub model_output_path: PathBuf,
    /// Text report file
    pub report_output_path: PathBuf,
    pub model_filename: String,
    /// Plot reported after training; a name matching one of
    /// [`PLOT_FILE_NAMES`] (with or without `.png`) resolves to that image
    pub plot_filename: String,
    /// Directory receiving the plots (defaults to `model_output_path`)
    pub plot_output_path: Option<PathBuf>,

    /// Validation fraction in (0, 1)
    pub test_size: f64,
    pub random_state: u64,
    /// Optimizer iteration bound
    pub max_iter: usize,
    /// Inverse L2 regularization strength
    pub inverse_regularization: f64,

    pub drop_cols: Vec<String>,
    pub noise_cols: Vec<String>,
    pub num_cols: Vec<String>,
    pub target_col: String,
    pub plot_features: [String; 2],
}

impl Settings {
    /// Load settings from an optional TOML file and the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::from_sources(config_file, std::env::vars())
    }

    /// Load settings from an optional TOML file overlaid by the given variables
    pub fn from_sources<I>(config_file: Option<&Path>, env: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut options = match config_file {
            Some(path) => read_toml_options(path)?,
            None => Map::new(),
        };

        for (key, value) in env {
            let name = key.to_ascii_lowercase();
            if REQUIRED_OPTIONS.contains(&name.as_str()) || OPTIONAL_OPTIONS.contains(&name.as_str()) {
                options.insert(name, Value::String(value));
            }
        }

        Self::from_options(&options)
    }

    /// Build settings from a mapping of option names to raw values
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let mut problems = Vec::new();

        let missing: Vec<&str> = REQUIRED_OPTIONS
            .iter()
            .copied()
            .filter(|name| options.get(*name).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "missing required option(s): {}",
                missing.join(", ")
            )));
        }

        let unprocessed_data_path = note(&mut problems, path_option(options, "unprocessed_data_path"));
        let processed_data_path = note(&mut problems, path_option(options, "processed_data_path"));
        let model_output_path = note(&mut problems, path_option(options, "model_output_path"));
        let report_output_path = note(&mut problems, path_option(options, "report_output_path"));
        let model_filename = note(&mut problems, string_option(options, "model_filename"));
        let plot_filename = note(&mut problems, string_option(options, "plot_filename"));
        let plot_output_path = match options.get("plot_output_path") {
            Some(v) if !v.is_null() => note(&mut problems, path_option(options, "plot_output_path")),
            _ => None,
        };
        let test_size = note(&mut problems, float_option(options, "test_size"));
        let random_state = note(&mut problems, int_option(options, "random_state"));
        let max_iter = note(&mut problems, int_option(options, "max_iter"));
        let inverse_regularization = match options.get("inverse_regularization") {
            Some(v) if !v.is_null() => note(&mut problems, float_option(options, "inverse_regularization")),
            _ => Some(1.0),
        };
        let drop_cols = note(&mut problems, list_option(options, "drop_cols"));
        let noise_cols = note(&mut problems, list_option(options, "noise_cols"));
        let num_cols = note(&mut problems, list_option(options, "num_cols"));
        let target_col = note(&mut problems, string_option(options, "target_col"));
        let plot_features = note(&mut problems, list_option(options, "plot_features"));

        if let Some(t) = test_size {
            if !(t > 0.0 && t < 1.0) {
                problems.push(format!("test_size must be in (0, 1), got {}", t));
            }
        }
        if max_iter == Some(0) {
            problems.push("max_iter must be a positive integer".to_string());
        }
        if let Some(c) = inverse_regularization {
            if !(c > 0.0 && c.is_finite()) {
                problems.push(format!("inverse_regularization must be positive, got {}", c));
            }
        }
        if let Some(name) = &plot_filename {
            if name.trim().is_empty() {
                problems.push("plot_filename must not be empty".to_string());
            }
        }
        if let Some(cols) = &num_cols {
            if cols.is_empty() {
                problems.push("num_cols must name at least one column".to_string());
            }
        }
        let plot_features: Option<[String; 2]> = match plot_features {
            Some(list) => match <[String; 2]>::try_from(list) {
                Ok(pair) => Some(pair),
                Err(list) => {
                    problems.push(format!(
                        "plot_features must name exactly two columns, got {}",
                        list.len()
                    ));
                    None
                }
            },
            None => None,
        };

        if !problems.is_empty() {
            return Err(PipelineError::ConfigError(problems.join("; ")));
        }

        // Every Option is Some here: a None always recorded a problem above.
        match (
            unprocessed_data_path,
            processed_data_path,
            model_output_path,
            report_output_path,
            model_filename,
            plot_filename,
            test_size,
            random_state,
            max_iter,
            inverse_regularization,
            drop_cols,
            noise_cols,
            num_cols,
            target_col,
            plot_features,
        ) {
            (
                Some(unprocessed_data_path),
                Some(processed_data_path),
                Some(model_output_path),
                Some(report_output_path),
                Some(model_filename),
                Some(plot_filename),
                Some(test_size),
                Some(random_state),
                Some(max_iter),
                Some(inverse_regularization),
                Some(drop_cols),
                Some(noise_cols),
                Some(num_cols),
                Some(target_col),
                Some(plot_features),
            ) => Ok(Self {
                unprocessed_data_path,
                processed_data_path,
                model_output_path,
                report_output_path,
                model_filename,
                plot_filename,
                plot_output_path,
                test_size,
                random_state,
                max_iter: max_iter as usize,
                inverse_regularization,
                drop_cols,
                noise_cols,
                num_cols,
                target_col,
                plot_features,
            }),
            _ => Err(PipelineError::ConfigError("incomplete settings".to_string())),
        }
    }

    /// Full path of the serialized model
    pub fn model_path(&self) -> PathBuf {
        self.model_output_path.join(&self.model_filename)
    }

    /// Directory receiving the diagnostic images
    pub fn plot_dir(&self) -> PathBuf {
        self.plot_output_path
            .clone()
            .unwrap_or_else(|| self.model_output_path.clone())
    }

    /// Full path of the headline plot named by `plot_filename`
    pub fn headline_plot_path(&self) -> PathBuf {
        let name = plot_file_name(&self.plot_filename).unwrap_or(self.plot_filename.as_str());
        self.plot_dir().join(name)
    }
}

/// Keep a parsed value, or record why it could not be parsed
fn note<T>(problems: &mut Vec<String>, parsed: std::result::Result<T, String>) -> Option<T> {
    match parsed {
        Ok(v) => Some(v),
        Err(msg) => {
            problems.push(msg);
            None
        }
    }
}

/// Resolve a configured plot name (with or without extension) to a fixed file name
fn plot_file_name(name: &str) -> Option<&'static str> {
    let stem = name.strip_suffix(".png").unwrap_or(name);
    PLOT_FILE_NAMES
        .iter()
        .copied()
        .find(|candidate| candidate.strip_suffix(".png") == Some(stem))
}

fn read_toml_options(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::ConfigError(format!("cannot read config file {}: {}", path.display(), e))
    })?;
    let value: Value = toml::from_str(&text)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PipelineError::ConfigError(format!(
            "config file {} is not a table",
            path.display()
        ))),
    }
}

fn string_option(options: &Map<String, Value>, name: &str) -> std::result::Result<String, String> {
    match options.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(format!("{} must not be empty", name)),
        Some(other) => Err(format!("{} must be a string, got {}", name, other)),
        None => Err(format!("missing required option: {}", name)),
    }
}

fn path_option(options: &Map<String, Value>, name: &str) -> std::result::Result<PathBuf, String> {
    string_option(options, name).map(PathBuf::from)
}

fn float_option(options: &Map<String, Value>, name: &str) -> std::result::Result<f64, String> {
    match options.get(name) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("{} must be a number", name)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{} must be a number, got `{}`", name, s)),
        Some(other) => Err(format!("{} must be a number, got {}", name, other)),
        None => Err(format!("missing required option: {}", name)),
    }
}

fn int_option(options: &Map<String, Value>, name: &str) -> std::result::Result<u64, String> {
    match options.get(name) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("{} must be a non-negative integer, got {}", name, n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("{} must be a non-negative integer, got `{}`", name, s)),
        Some(other) => Err(format!("{} must be a non-negative integer, got {}", name, other)),
        None => Err(format!("missing required option: {}", name)),
    }
}

fn list_option(options: &Map<String, Value>, name: &str) -> std::result::Result<Vec<String>, String> {
    match options.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!("{} must be a list of strings, found {}", name, other)),
            })
            .collect(),
        Some(Value::String(s)) => parse_list_string(s)
            .ok_or_else(|| format!("{} must be a JSON array or comma-separated list", name)),
        Some(other) => Err(format!("{} must be a list of strings, got {}", name, other)),
        None => Err(format!("missing required option: {}", name)),
    }
}

/// Parse `["a", "b"]` or `a, b` into column names
fn parse_list_string(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).ok();
    }
    Some(
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
