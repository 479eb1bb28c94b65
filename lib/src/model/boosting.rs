//! Gradient-boosted trees with logistic loss.
//!
//! Each round fits a second-order tree to the gradient `p - y` and hessian
//! `p (1 - p)` of the current margins, shrinks its leaves by the learning rate,
//! and adds it to the ensemble. Positive rows have their gradient and hessian
//! multiplied by `scale_pos_weight`, which defaults to `negatives / positives`.

use crate::loss::sigmoid;
use crate::model::tree::{GradStats, Tree, TreeBuilder, TreeConfig};
use crate::model::{check_training_data, Classifier, ModelError, ModelKind};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const MIN_HESSIAN: f64 = 1e-16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 penalty on leaf values.
    pub lambda: f64,
    pub min_child_weight: f64,
    /// Fraction of rows sampled for each tree.
    pub subsample: f64,
    /// `None` uses `negatives / positives` of the training labels.
    pub scale_pos_weight: Option<f64>,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 200,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            scale_pos_weight: None,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidHyperparameter(msg));
        if self.n_rounds == 0 || self.max_depth == 0 {
            return invalid("n_rounds and max_depth must be positive".to_string());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return invalid(format!("lambda must be non-negative, got {}", self.lambda));
        }
        if let Some(w) = self.scale_pos_weight {
            if !(w.is_finite() && w > 0.0) {
                return invalid(format!("scale_pos_weight must be positive, got {}", w));
            }
        }
        Ok(())
    }
}

/// Unfitted boosted ensemble.
#[derive(Clone, Debug, Default)]
pub struct GradientBoosting {
    config: BoostingConfig,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn fit(&self, x: ArrayView2<f64>, y: &[u8]) -> Result<FittedGradientBoosting, ModelError> {
        check_training_data(x, y)?;
        let config = &self.config;
        config.validate()?;

        let n = x.nrows();
        let positives = y.iter().filter(|&&l| l == 1).count();
        let pos_weight = config
            .scale_pos_weight
            .unwrap_or((n - positives) as f64 / positives as f64);
        let tree_config = TreeConfig {
            max_depth: Some(config.max_depth),
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_child_weight: config.min_child_weight,
            max_features: None,
            lambda: config.lambda,
        };

        let base_score = 0.0;
        let mut margins = vec![base_score; n];
        let mut rng = StdRng::seed_from_u64(config.seed);
        let n_sampled = ((n as f64 * config.subsample).round() as usize).clamp(1, n);
        let mut trees = Vec::with_capacity(config.n_rounds);

        for round in 0..config.n_rounds {
            let stats: Vec<GradStats> = margins
                .iter()
                .zip(y)
                .map(|(&margin, &label)| {
                    let p = sigmoid(margin);
                    let w = if label == 1 { pos_weight } else { 1.0 };
                    GradStats {
                        gradient: w * (p - f64::from(label)),
                        hessian: w * (p * (1.0 - p)).max(MIN_HESSIAN),
                    }
                })
                .collect();

            let rows: Vec<usize> = if n_sampled < n {
                let mut rows = rand::seq::index::sample(&mut rng, n, n_sampled).into_vec();
                rows.sort_unstable();
                rows
            } else {
                (0..n).collect()
            };

            let mut tree = TreeBuilder::new(x, &stats, &tree_config).build(&rows, &mut rng);
            tree.scale_leaves(config.learning_rate);
            for (margin, row) in margins.iter_mut().zip(x.rows()) {
                *margin += tree.evaluate(row);
            }
            tracing::trace!(
                round = round + 1,
                leaves = tree.n_leaves(),
                "boosting round finished"
            );
            trees.push(tree);
        }

        tracing::debug!(n_rounds = trees.len(), scale_pos_weight = pos_weight, "gradient boosting fitted");
        Ok(FittedGradientBoosting {
            n_features: x.ncols(),
            base_score,
            trees,
        })
    }
}

/// Persisted form of a [`FittedGradientBoosting`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_features: usize,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FittedGradientBoosting {
    n_features: usize,
    base_score: f64,
    trees: Vec<Tree>,
}

impl FittedGradientBoosting {
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Raw margin before the logistic link.
    pub fn margin(&self, x: ArrayView1<f64>) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.evaluate(x)).sum::<f64>()
    }

    pub fn extract_params(&self) -> BoostingParams {
        BoostingParams {
            n_features: self.n_features,
            base_score: self.base_score,
            trees: self.trees.clone(),
        }
    }

    pub fn from_params(params: BoostingParams) -> Result<Self, ModelError> {
        if params.n_features == 0 || params.trees.is_empty() {
            return Err(ModelError::InvalidModel(
                "boosted ensemble has no features or no trees".to_string(),
            ));
        }
        if !params.base_score.is_finite() {
            return Err(ModelError::InvalidModel("non-finite base score".to_string()));
        }
        for tree in &params.trees {
            tree.validate(params.n_features)?;
        }
        Ok(Self {
            n_features: params.n_features,
            base_score: params.base_score,
            trees: params.trees,
        })
    }
}

impl Classifier for FittedGradientBoosting {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosting
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> f64 {
        sigmoid(self.margin(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::separable;
    use ndarray::array;

    #[test]
    fn test_first_round_leaf_values() {
        // One split on a single feature; margins start at 0 so p = 0.5,
        // g = ±0.5, h = 0.25 per row
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let y = [0, 0, 1, 1];
        let config = BoostingConfig {
            n_rounds: 1,
            learning_rate: 1.0,
            lambda: 0.0,
            min_child_weight: 0.0,
            ..Default::default()
        };
        let model = GradientBoosting::new(config).fit(x.view(), &y).unwrap();

        // leaf = -G/H = -(2 * 0.5) / (2 * 0.25) = -2 on the negative side
        assert!((model.margin(array![0.0].view()) + 2.0).abs() < 1e-12);
        assert!((model.margin(array![1.0].view()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_pos_weight_shifts_probabilities() {
        let (x, y) = separable(120);
        let config = |w: f64| BoostingConfig {
            n_rounds: 3,
            max_depth: 2,
            scale_pos_weight: Some(w),
            ..Default::default()
        };
        let plain = GradientBoosting::new(config(1.0)).fit(x.view(), &y).unwrap();
        let heavy = GradientBoosting::new(config(5.0)).fit(x.view(), &y).unwrap();

        let mean = |m: &FittedGradientBoosting| m.predict_proba_batch(x.view()).mean().unwrap_or(0.0);
        assert!(mean(&heavy) > mean(&plain));
    }

    #[test]
    fn test_fit_is_deterministic_with_subsample() {
        let (x, y) = separable(100);
        let config = BoostingConfig {
            n_rounds: 10,
            subsample: 0.7,
            ..Default::default()
        };
        let a = GradientBoosting::new(config.clone()).fit(x.view(), &y).unwrap();
        let b = GradientBoosting::new(config).fit(x.view(), &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_hyperparameters() {
        let (x, y) = separable(20);
        for config in [
            BoostingConfig {
                subsample: 0.0,
                ..Default::default()
            },
            BoostingConfig {
                learning_rate: -0.1,
                ..Default::default()
            },
            BoostingConfig {
                scale_pos_weight: Some(0.0),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                GradientBoosting::new(config).fit(x.view(), &y),
                Err(ModelError::InvalidHyperparameter(_))
            ));
        }
    }
}
