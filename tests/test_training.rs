//! Integration tests for the training engine, split, classifier and evaluation

use ndarray::{Array1, Array2};
use polars::prelude::*;
use tabclass::error::PipelineError;
use tabclass::evaluation::{evaluate, EvaluationStrategy};
use tabclass::training::{Classifier, StratifiedSplitter, TrainEngine};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// 60 rows, two noisy features, labels driven mostly by `x1`
fn binary_frame() -> DataFrame {
    let n = 60;
    let label: Vec<i64> = (0..n).map(|i| i64::from(i % 3 == 0)).collect();
    let x1: Vec<f64> = (0..n)
        .map(|i| label[i] as f64 * 2.0 + ((i * 17) % 11) as f64 / 10.0 - 0.5)
        .collect();
    let x2: Vec<f64> = (0..n).map(|i| ((i * 7) % 13) as f64 / 6.0 - 1.0).collect();
    df!("x1" => x1, "x2" => x2, "target" => label).unwrap()
}

fn engine() -> TrainEngine {
    TrainEngine::new(names(&["x1", "x2"]), "target")
        .with_test_size(0.25)
        .with_random_state(7)
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_prepare_stratifies_validation() {
    let data = engine().prepare(&binary_frame()).unwrap();

    assert_eq!(data.x_val.nrows(), 15);
    assert_eq!(data.x_train.nrows(), 45);
    assert_eq!(data.classes, names(&["0", "1"]));
    let positives = data.y_val.iter().filter(|&&c| c == 1).count();
    assert!((positives as i64 - 5).abs() <= 1);
}

#[test]
fn test_prepare_is_deterministic() {
    let a = engine().prepare(&binary_frame()).unwrap();
    let b = engine().prepare(&binary_frame()).unwrap();
    assert_eq!(a.split, b.split);

    let c = engine().with_random_state(8).prepare(&binary_frame()).unwrap();
    assert_ne!(a.split, c.split);
}

#[test]
fn test_fit_and_evaluate_binary() {
    let engine = engine();
    let data = engine.prepare(&binary_frame()).unwrap();
    let model = engine.fit(&data).unwrap();

    let evaluation = evaluate(&model, &data.x_val, &data.y_val).unwrap();
    assert_eq!(evaluation.strategy, EvaluationStrategy::Binary { positive: 1 });
    assert!(evaluation.accuracy() >= 0.8);
    assert!(evaluation.roc_auc.unwrap() > 0.8);

    let report = evaluation.render_report();
    assert!(report.starts_with("ROC-AUC: "));
    assert!(report.contains("weighted avg"));
}

#[test]
fn test_missing_target_is_schema_error() {
    let df = binary_frame().drop("target").unwrap();
    let err = engine().prepare(&df).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaError { ref missing } if missing == &names(&["target"])));
}

#[test]
fn test_singleton_class_fails_stratification() {
    let df = df!(
        "x1" => &[0.1, 0.2, 0.3, 0.4, 0.5],
        "x2" => &[1.0, 0.0, 1.0, 0.0, 1.0],
        "target" => &["a", "a", "a", "a", "b"]
    )
    .unwrap();
    let err = engine().prepare(&df).unwrap_err();
    assert!(matches!(err, PipelineError::StratificationError(_)));
}

// ============================================================================
// Split and classifier
// ============================================================================

#[test]
fn test_splitter_partitions_every_row_once() {
    let y = Array1::from_iter((0..50).map(|i| i % 5));
    let split = StratifiedSplitter::new(0.3, 1).unwrap().split(&y).unwrap();

    let mut all: Vec<usize> = split.train.iter().chain(split.validation.iter()).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..50).collect::<Vec<_>>());
    assert_eq!(split.validation.len(), 15);
}

#[test]
fn test_multiclass_probabilities_sum_to_one() {
    let x = Array2::from_shape_fn((30, 2), |(i, j)| {
        let k = (i % 3) as f64;
        k * 3.0 + j as f64 * 0.5 + (i % 4) as f64 * 0.1
    });
    let y: Vec<String> = (0..30).map(|i| ["r", "g", "b"][i % 3].to_string()).collect();

    let mut model = tabclass::training::LogisticRegression::new().with_max_iter(300);
    model.fit(&x, &y).unwrap();

    assert_eq!(model.n_classes(), 3);
    let proba = Classifier::predict_proba(&model, &x).unwrap().unwrap();
    for row in proba.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
    let predicted = model.predict_labels(&x).unwrap();
    let correct = predicted.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
    assert!(correct >= 27);
}
