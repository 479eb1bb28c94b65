//! # telco-churn
//!
//! Customer churn prediction for a telecom subscriber base, with one feature
//! encoding shared bit for bit by the training job and the serving process.
//!
//! ## Core Design Principles
//!
//! - **Fit once, freeze, persist**: every learned piece of preprocessing (label
//!   encoders, the `TotalCharges` median, the column order) lives in a
//!   [`FittedFeaturePipeline`] that training writes and serving reads.
//! - **Training/Inference Separation**: fitted models contain only prediction
//!   parameters; losses, optimizers and trainers never reach the serving process.
//! - **Stateful Type Safety**: gradient-trained models carry their state in the
//!   type system (`Unfitted` vs `Fitted`).
//!
//! ## Quick Start
//!
//! ```no_run
//! use telco_churn::config::TrainConfig;
//! use telco_churn::service::{InferenceService, LoadedArtifacts};
//! use telco_churn::training::TrainingDriver;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = TrainingDriver::new(TrainConfig::default())?;
//! let (outcome, paths) = driver.run()?;
//! println!("selected {}", outcome.selected_result().kind);
//!
//! let service = InferenceService::new(Arc::new(LoadedArtifacts::load(&paths)?));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `schema`: raw customer record and the fixed field list
//! - `preprocessing`: binary mapping, label encoders, median coercion, feature assembly
//! - `dataset`: CSV loading, stratified split, batch datasets
//! - `model`: logistic regression, random forest and gradient boosting classifiers
//! - `loss`, `optimizer`, `regularizers`, `trainer`: the gradient training loop
//! - `metrics`: accuracy, precision, recall, F1 and the classification report
//! - `training`: the end-to-end training job
//! - `service`: single-record inference and its HTTP router
//! - `serialization`: versioned artifact persistence

/// Raw customer records and field metadata.
pub mod schema;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Data preprocessing transformers shared by training and serving.
pub mod preprocessing;

/// Differentiable loss functions for model training.
pub mod loss;

/// Churn classifiers with compile-time state safety.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// Weight regularization strategies to prevent overfitting.
pub mod regularizers;

/// Model persistence.
pub mod serialization;

/// High-level training loop orchestration.
pub mod trainer;

/// Classification metrics.
pub mod metrics;

/// Candidate comparison and artifact export.
pub mod training;

/// Training and serving configuration.
pub mod config;

/// Inference over persisted artifacts.
pub mod service;

pub use model::{Classifier, FittedClassifier, ModelKind};
pub use preprocessing::{EncodingError, FeaturePipeline, FittedFeaturePipeline};
pub use schema::CustomerRecord;
