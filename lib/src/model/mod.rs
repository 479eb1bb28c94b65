//! Churn classifiers.
//!
//! Two families live here:
//! - gradient-trained models ([`logistic`]) that follow the [`TrainableModel`]
//!   protocol and are fitted by [`crate::trainer::Trainer`]
//! - tree ensembles ([`forest`], [`boosting`]) built on the CART trees in [`tree`]
//!
//! Whatever the family, a fitted model ends up as a [`FittedClassifier`], which is
//! what gets scored, persisted and served.

use crate::serialization::{load_artifact, save_artifact, ArtifactError, ArtifactKind};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub mod boosting;
pub mod forest;
pub mod logistic;
pub mod state;
pub mod tree;

pub use self::boosting::{BoostingConfig, FittedGradientBoosting, GradientBoosting};
pub use self::forest::{FittedRandomForest, ForestConfig, RandomForest};
pub use self::logistic::{
    LogisticClassifier, LogisticConfig, LogisticModel, LogisticParams, LogisticRegression,
};
pub use self::state::{Fitted, Unfitted};

/// Errors raised while fitting or restoring a classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Training labels contain a single class")]
    SingleClass,
    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Training failed: {0}")]
    Training(String),
}

/// Check the common preconditions of every `fit`.
pub(crate) fn check_training_data(x: ArrayView2<f64>, y: &[u8]) -> Result<(), ModelError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|&&l| l > 1) {
        return Err(ModelError::ShapeMismatch(format!(
            "label {} is not binary",
            bad
        )));
    }
    let positives = y.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

/// Training protocol for gradient-fitted models.
///
/// The trainer calls `forward`, feeds the loss gradient to `backward`, asks the
/// optimizer for new parameters and writes them back with `update_params`.
/// `into_fitted` strips everything that is only needed for training.
pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic the optimizer and regularizers need on a parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
}

/// A fitted binary classifier over encoded feature vectors.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Width of the feature vectors the model was trained on.
    fn n_features(&self) -> usize;

    /// Probability of the positive class (churn).
    fn predict_proba(&self, x: ArrayView1<f64>) -> f64;

    /// Hard label, `1` for churn.
    fn predict(&self, x: ArrayView1<f64>) -> u8 {
        u8::from(self.predict_proba(x) >= 0.5)
    }

    fn predict_proba_batch(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_proba(row)).collect()
    }

    fn predict_batch(&self, x: ArrayView2<f64>) -> Vec<u8> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

/// Model families the training driver can choose from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persisted form of a [`FittedClassifier`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ClassifierParams {
    Logistic(LogisticParams),
    RandomForest(forest::ForestParams),
    GradientBoosting(boosting::BoostingParams),
}

/// The selected model, whatever its family.
#[derive(Clone, Debug)]
pub enum FittedClassifier {
    Logistic(LogisticClassifier),
    RandomForest(FittedRandomForest),
    GradientBoosting(FittedGradientBoosting),
}

impl FittedClassifier {
    fn inner(&self) -> &dyn Classifier {
        match self {
            FittedClassifier::Logistic(m) => m,
            FittedClassifier::RandomForest(m) => m,
            FittedClassifier::GradientBoosting(m) => m,
        }
    }

    pub fn extract_params(&self) -> ClassifierParams {
        match self {
            FittedClassifier::Logistic(m) => ClassifierParams::Logistic(m.params().clone()),
            FittedClassifier::RandomForest(m) => ClassifierParams::RandomForest(m.extract_params()),
            FittedClassifier::GradientBoosting(m) => {
                ClassifierParams::GradientBoosting(m.extract_params())
            }
        }
    }

    /// Rebuild a classifier, validating every tree and weight vector.
    pub fn from_params(params: ClassifierParams) -> Result<Self, ModelError> {
        Ok(match params {
            ClassifierParams::Logistic(p) => {
                FittedClassifier::Logistic(LogisticClassifier::from_params(p)?)
            }
            ClassifierParams::RandomForest(p) => {
                FittedClassifier::RandomForest(FittedRandomForest::from_params(p)?)
            }
            ClassifierParams::GradientBoosting(p) => {
                FittedClassifier::GradientBoosting(FittedGradientBoosting::from_params(p)?)
            }
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        save_artifact(path.as_ref(), ArtifactKind::Classifier, &self.extract_params())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let params: ClassifierParams = load_artifact(path.as_ref(), ArtifactKind::Classifier)?;
        Self::from_params(params).map_err(|e| ArtifactError::Incompatible(e.to_string()))
    }
}

impl Classifier for FittedClassifier {
    fn kind(&self) -> ModelKind {
        self.inner().kind()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> f64 {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: ArrayView1<f64>) -> u8 {
        self.inner().predict(x)
    }
}

impl From<LogisticClassifier> for FittedClassifier {
    fn from(model: LogisticClassifier) -> Self {
        FittedClassifier::Logistic(model)
    }
}

impl From<FittedRandomForest> for FittedClassifier {
    fn from(model: FittedRandomForest) -> Self {
        FittedClassifier::RandomForest(model)
    }
}

impl From<FittedGradientBoosting> for FittedClassifier {
    fn from(model: FittedGradientBoosting) -> Self {
        FittedClassifier::GradientBoosting(model)
    }
}

/// One candidate of the model comparison, with its hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSpec {
    RandomForest(ForestConfig),
    GradientBoosting(BoostingConfig),
    LogisticRegression(LogisticConfig),
}

impl CandidateSpec {
    pub fn kind(&self) -> ModelKind {
        match self {
            CandidateSpec::RandomForest(_) => ModelKind::RandomForest,
            CandidateSpec::GradientBoosting(_) => ModelKind::GradientBoosting,
            CandidateSpec::LogisticRegression(_) => ModelKind::LogisticRegression,
        }
    }

    pub fn fit(&self, x: ArrayView2<f64>, y: &[u8]) -> Result<FittedClassifier, ModelError> {
        Ok(match self {
            CandidateSpec::RandomForest(config) => {
                RandomForest::new(config.clone()).fit(x, y)?.into()
            }
            CandidateSpec::GradientBoosting(config) => {
                GradientBoosting::new(config.clone()).fit(x, y)?.into()
            }
            CandidateSpec::LogisticRegression(config) => logistic::fit(config, x, y)?.into(),
        })
    }
}

/// Random forest, gradient boosting, then logistic regression.
pub fn default_candidates() -> Vec<CandidateSpec> {
    vec![
        CandidateSpec::RandomForest(ForestConfig::default()),
        CandidateSpec::GradientBoosting(BoostingConfig::default()),
        CandidateSpec::LogisticRegression(LogisticConfig::default()),
    ]
}
