//! End-to-end tests: settings from the environment, preprocess + train runs,
//! artifacts on disk

use std::fs;
use std::path::Path;

use tabclass::config::{Settings, PLOT_FILE_NAMES};
use tabclass::error::PipelineError;
use tabclass::export::ModelArtifact;
use tabclass::pipeline::{run_preprocess, ModelTrainer};

// ============================================================================
// Fixtures
// ============================================================================

/// 100 customers, 30 of them churned; one missing income and one duplicated row
fn write_binary_dataset(path: &Path) {
    let mut csv = String::from("id,session_token,age,income,tenure,churn\n");
    for i in 0..100u32 {
        let churn = u32::from(i % 10 < 3);
        let age = 20 + (i * 7) % 40 + churn * 15;
        let income = if i == 5 {
            String::new()
        } else {
            (1000 + (i * 37) % 500 + churn * 300).to_string()
        };
        let tenure = (i * 13) % 24;
        csv.push_str(&format!("{i},tok{},{age},{income},{tenure},{churn}\n", i * 31 % 97));
    }
    // exact duplicate of the last row
    let last = csv.lines().last().unwrap().to_string();
    csv.push_str(&last);
    csv.push('\n');
    fs::write(path, csv).unwrap();
}

/// 90 rows over three well-separated species
fn write_multiclass_dataset(path: &Path) {
    let mut csv = String::from("id,length,width,species\n");
    let species = ["setosa", "versicolor", "virginica"];
    for i in 0..90u32 {
        let k = (i % 3) as usize;
        let length = 1.0 + k as f64 * 4.0 + (i % 7) as f64 * 0.3;
        let width = 0.5 + k as f64 * 2.0 + (i % 5) as f64 * 0.2;
        csv.push_str(&format!("{i},{length:.2},{width:.2},{}\n", species[k]));
    }
    fs::write(path, csv).unwrap();
}

fn env_for(dir: &Path, num_cols: &str, target: &str, plot: &str, drop: &str) -> Vec<(String, String)> {
    let join = |name: &str| dir.join(name).display().to_string();
    [
        ("UNPROCESSED_DATA_PATH", join("raw.csv")),
        ("PROCESSED_DATA_PATH", join("processed/clean.csv")),
        ("MODEL_OUTPUT_PATH", join("models")),
        ("REPORT_OUTPUT_PATH", join("reports/report.txt")),
        ("MODEL_FILENAME", "model.bin".to_string()),
        ("PLOT_FILENAME", "roc_curve.png".to_string()),
        ("TEST_SIZE", "0.2".to_string()),
        ("RANDOM_STATE", "42".to_string()),
        ("MAX_ITER", "200".to_string()),
        ("DROP_COLS", drop.to_string()),
        ("NOISE_COLS", "[]".to_string()),
        ("NUM_COLS", num_cols.to_string()),
        ("TARGET_COL", target.to_string()),
        ("PLOT_FEATURES", plot.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn binary_settings(dir: &Path) -> Settings {
    write_binary_dataset(&dir.join("raw.csv"));
    let env = env_for(dir, "age,income,tenure", "churn", "age,income", "id,session_token");
    Settings::from_sources(None, env).unwrap()
}

// ============================================================================
// Preprocess
// ============================================================================

#[test]
fn test_preprocess_writes_cleaned_csv() {
    let dir = tempfile::tempdir().unwrap();
    let settings = binary_settings(dir.path());

    let output = run_preprocess(&settings).unwrap();

    assert_eq!(output.rows_loaded, 101);
    assert_eq!(output.duplicates_removed, 1);
    assert_eq!(output.data.height(), 100);
    assert!(output.data.column("id").is_err());
    assert!(output.data.column("session_token").is_err());

    let written = fs::read_to_string(&settings.processed_data_path).unwrap();
    let header = written.lines().next().unwrap();
    assert_eq!(header, "age,income,tenure,churn");
    assert_eq!(written.lines().count(), 101);
}

#[test]
fn test_preprocess_missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_for(dir.path(), "age", "churn", "age,income", "[]");
    let settings = Settings::from_sources(None, env).unwrap();

    let err = run_preprocess(&settings).unwrap_err();
    match err {
        PipelineError::NotFound { path } => assert!(path.ends_with("raw.csv")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

// ============================================================================
// Train
// ============================================================================

#[test]
fn test_binary_training_run() {
    let dir = tempfile::tempdir().unwrap();
    let settings = binary_settings(dir.path());

    let summary = ModelTrainer::new(&settings).run().unwrap();

    assert_eq!(summary.validation_rows, 20);
    assert_eq!(summary.train_rows, 80);
    assert_eq!(summary.classes, vec!["0".to_string(), "1".to_string()]);
    let auc = summary.roc_auc.unwrap();
    assert!((0.0..=1.0).contains(&auc));

    // report: exactly one ROC-AUC line, first, then a two-class table
    let report = fs::read_to_string(&settings.report_output_path).unwrap();
    assert_eq!(report, summary.report);
    let first = report.lines().find(|l| !l.trim().is_empty()).unwrap();
    assert!(first.starts_with("ROC-AUC: "));
    assert_eq!(report.matches("ROC-AUC:").count(), 1);
    let class_rows: Vec<&str> = report
        .lines()
        .filter(|l| l.trim_start().starts_with("0 ") || l.trim_start().starts_with("1 "))
        .collect();
    assert_eq!(class_rows.len(), 2);

    // validation support is 14 / 6 within one row
    let support = |row: &str| -> usize { row.split_whitespace().last().unwrap().parse().unwrap() };
    let negatives = support(class_rows[0]);
    let positives = support(class_rows[1]);
    assert_eq!(negatives + positives, 20);
    assert!((positives as i64 - 6).abs() <= 1);

    for name in PLOT_FILE_NAMES {
        assert!(settings.plot_dir().join(name).is_file(), "missing plot {name}");
    }
    assert_eq!(summary.plot_paths.len(), 4);

    let artifact = ModelArtifact::load(&settings.model_path()).unwrap();
    assert_eq!(artifact.target_column, "churn");
    assert_eq!(artifact.feature_columns, vec!["age", "income", "tenure"]);
    assert_eq!(artifact.classifier.classes, summary.classes);
    assert!(artifact.transform.is_fitted());
}

#[test]
fn test_free_plot_filename_still_writes_every_plot() {
    let dir = tempfile::tempdir().unwrap();
    write_binary_dataset(&dir.path().join("raw.csv"));
    let env = env_for(dir.path(), "age,income,tenure", "churn", "age,income", "id,session_token")
        .into_iter()
        .map(|(k, v)| {
            if k == "PLOT_FILENAME" {
                (k, "decision_plot.png".to_string())
            } else {
                (k, v)
            }
        });
    let settings = Settings::from_sources(None, env).unwrap();
    assert_eq!(settings.headline_plot_path(), settings.plot_dir().join("decision_plot.png"));

    let summary = ModelTrainer::new(&settings).run().unwrap();

    assert_eq!(summary.plot_paths.len(), 4);
    for name in PLOT_FILE_NAMES {
        assert!(settings.plot_dir().join(name).is_file(), "missing plot {name}");
    }
    assert!(settings.model_path().is_file());
}

#[test]
fn test_training_is_deterministic_for_a_seed() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = ModelTrainer::new(&binary_settings(first_dir.path())).run().unwrap();
    let second = ModelTrainer::new(&binary_settings(second_dir.path())).run().unwrap();

    assert_eq!(first.report, second.report);
    assert_eq!(first.roc_auc, second.roc_auc);
}

#[test]
fn test_multiclass_training_run() {
    let dir = tempfile::tempdir().unwrap();
    write_multiclass_dataset(&dir.path().join("raw.csv"));
    let env = env_for(dir.path(), "length,width", "species", "length,width", "id");
    let settings = Settings::from_sources(None, env).unwrap();

    let summary = ModelTrainer::new(&settings).run().unwrap();

    assert_eq!(summary.classes.len(), 3);
    assert_eq!(summary.validation_rows, 18);
    assert!(summary.roc_auc.is_none());
    assert!(!summary.report.contains("ROC-AUC"));
    assert!(summary.report.contains("versicolor"));
    assert!(summary.accuracy > 0.9);
    for name in PLOT_FILE_NAMES {
        assert!(settings.plot_dir().join(name).is_file(), "missing plot {name}");
    }
}

#[test]
fn test_missing_target_fails_before_fitting() {
    let dir = tempfile::tempdir().unwrap();
    write_binary_dataset(&dir.path().join("raw.csv"));
    let env = env_for(dir.path(), "age,income,tenure", "outcome", "age,income", "id,session_token");
    let settings = Settings::from_sources(None, env).unwrap();

    let err = ModelTrainer::new(&settings).run().unwrap_err();

    assert!(matches!(err, PipelineError::SchemaError { ref missing } if missing == &vec!["outcome".to_string()]));
    assert!(!settings.model_path().exists());
    assert!(!settings.report_output_path.exists());
}

#[test]
fn test_plot_feature_outside_numeric_columns_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_binary_dataset(&dir.path().join("raw.csv"));
    let env = env_for(dir.path(), "age,tenure", "churn", "age,income", "id,session_token");
    let settings = Settings::from_sources(None, env).unwrap();

    let err = ModelTrainer::new(&settings).run().unwrap_err();

    assert!(matches!(err, PipelineError::SchemaError { .. }));
    assert!(!settings.model_path().exists());
}
