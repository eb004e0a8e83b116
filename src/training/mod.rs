//! Model training module
//!
//! Provides:
//! - Stratified train/validation splitting
//! - L2-regularized logistic regression (binary and multinomial)
//! - An L-BFGS optimizer for smooth objectives
//! - The `Classifier` trait consumed by evaluation and plotting

mod engine;
mod models;
pub mod linear_models;
pub mod optim;
pub mod split;

pub use engine::{PreparedData, TrainEngine};
pub use linear_models::LogisticRegression;
pub use models::Classifier;
pub use optim::{Lbfgs, LbfgsResult};
pub use split::{SplitIndices, StratifiedSplitter};
