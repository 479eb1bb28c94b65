//! Logistic regression with compile-time state tracking.
//!
//! - [`LogisticRegression`] = `LogisticModel<Unfitted>`: implements
//!   [`TrainableModel`] and is fitted by [`Trainer`].
//! - [`LogisticClassifier`] = `LogisticModel<Fitted>`: inference only,
//!   `p = σ(w·x + b)`.
//!
//! [`fit`] standardizes the features before running the trainer and folds the
//! scaler back into the weights afterwards, so the fitted model consumes the
//! same raw encoded vectors as the tree ensembles.

use crate::dataset::InMemoryDataset;
use crate::loss::{sigmoid, BCEWithLogitsLoss};
use crate::model::{
    check_training_data, Classifier, Fitted, ModelError, ModelKind, ParamOps, TrainableModel,
    Unfitted,
};
use crate::optimizer::SGD;
use crate::preprocessing::{FittedTransformer, StandardScaler, Transformer};
use crate::regularizers::L2;
use crate::trainer::Trainer;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Weights and bias of a logistic model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LogisticParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }
}

impl ParamOps for LogisticParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            weights: &self.weights * factor,
            bias: self.bias * factor,
        }
    }
}

/// A logistic model with state encoded at the type level.
///
/// `predict_proba` is only available once the model is `Fitted`.
#[derive(Clone, Debug)]
pub struct LogisticModel<S> {
    params: LogisticParams,
    _state: PhantomData<S>,
}

/// Alias for an **unfitted** logistic regression model, used with [`Trainer`].
pub type LogisticRegression = LogisticModel<Unfitted>;

/// A trained logistic model.
pub type LogisticClassifier = LogisticModel<Fitted>;

impl LogisticRegression {
    /// Zero-initialized model over `n_features` inputs.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(LogisticParams::zeros(n_features))
    }

    /// Constructs a model from explicit parameters (e.g., for a warm start).
    pub fn from_params(params: LogisticParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

impl LogisticClassifier {
    /// Restore a trained model; every weight must be finite.
    pub fn from_params(params: LogisticParams) -> Result<Self, ModelError> {
        if params.weights.is_empty() {
            return Err(ModelError::InvalidModel(
                "logistic model has no weights".to_string(),
            ));
        }
        if !params.bias.is_finite() || params.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::InvalidModel(
                "logistic model has non-finite weights".to_string(),
            ));
        }
        Ok(Self {
            params,
            _state: PhantomData,
        })
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    /// Raw score `w·x + b`.
    pub fn decision_function(&self, x: ArrayView1<f64>) -> f64 {
        self.params.weights.dot(&x) + self.params.bias
    }
}

/// Forward pass: `X @ w + b` (logits).
/// Backward pass: `∇w = Xᵀ · grad`, `∇b = sum(grad)`.
impl TrainableModel for LogisticRegression {
    type Input = Array2<f64>;
    type Prediction = Array1<f64>;
    type Params = LogisticParams;
    type Gradients = LogisticParams;
    type Output = LogisticClassifier;

    fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> LogisticParams {
        LogisticParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn params(&self) -> &LogisticParams {
        &self.params
    }

    fn update_params(&mut self, params: &LogisticParams) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LogisticClassifier {
        LogisticModel {
            params: self.params,
            _state: PhantomData,
        }
    }
}

impl Classifier for LogisticClassifier {
    fn kind(&self) -> ModelKind {
        ModelKind::LogisticRegression
    }

    fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> f64 {
        sigmoid(self.decision_function(x))
    }
}

/// Hyperparameters of the logistic candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub l2: f64,
    /// Weight classes inversely to their frequency.
    pub balanced: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 200,
            batch_size: 64,
            l2: 1e-4,
            balanced: true,
        }
    }
}

impl LogisticConfig {
    fn validate(&self) -> Result<(), ModelError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ModelError::InvalidHyperparameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(ModelError::InvalidHyperparameter(
                "epochs and batch_size must be positive".to_string(),
            ));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(ModelError::InvalidHyperparameter(format!(
                "l2 must be non-negative, got {}",
                self.l2
            )));
        }
        Ok(())
    }
}

/// Fit a logistic classifier on raw encoded features.
pub fn fit(
    config: &LogisticConfig,
    x: ArrayView2<f64>,
    y: &[u8],
) -> Result<LogisticClassifier, ModelError> {
    check_training_data(x, y)?;
    config.validate()?;

    let scaler = StandardScaler::new()
        .fit(&x.to_owned())
        .map_err(|e| ModelError::Training(e.to_string()))?;
    let x_scaled = scaler
        .transform(&x.to_owned())
        .map_err(|e| ModelError::Training(e.to_string()))?;
    let targets: Array1<f64> = y.iter().map(|&l| f64::from(l)).collect();
    let dataset =
        InMemoryDataset::new(x_scaled, targets).map_err(|e| ModelError::Training(e.to_string()))?;

    let loss = if config.balanced {
        BCEWithLogitsLoss::balanced(y)
    } else {
        BCEWithLogitsLoss::new()
    };
    let trainer = Trainer::builder(loss, SGD::new(config.learning_rate), L2::new(config.l2))
        .batch_size(config.batch_size)
        .max_epochs(config.epochs)
        .verbose(true)
        .build();
    let scaled = trainer.fit(LogisticRegression::new(x.ncols()), &dataset)?;

    // w·(x - mean)/std + b  ==  (w/std)·x + (b - Σ w·mean/std)
    let weights = &scaled.params.weights / scaler.std();
    let bias = scaled.params.bias - weights.dot(scaler.mean());
    LogisticClassifier::from_params(LogisticParams { weights, bias })
}
