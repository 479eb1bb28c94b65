//! Bagged ensemble of Gini trees.
//!
//! Each tree sees a bootstrap sample of the rows and a random subset of the
//! features at every node. Bootstrap multiplicities and class weights are
//! folded into per-row sample weights, so duplicated rows are never copied.
//! The churn probability is the mean of the trees' leaf fractions.

use crate::loss::balanced_class_weights;
use crate::model::tree::{ClassStats, Tree, TreeBuilder, TreeConfig};
use crate::model::{check_training_data, Classifier, ModelError, ModelKind};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of features tried at each split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k.clamp(1, n_features),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    /// Weight classes inversely to their frequency.
    pub balanced: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            balanced: true,
            seed: 42,
        }
    }
}

/// Unfitted random forest.
#[derive(Clone, Debug, Default)]
pub struct RandomForest {
    config: ForestConfig,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn fit(&self, x: ArrayView2<f64>, y: &[u8]) -> Result<FittedRandomForest, ModelError> {
        check_training_data(x, y)?;
        let config = &self.config;
        if config.n_trees == 0 {
            return Err(ModelError::InvalidHyperparameter(
                "n_trees must be positive".to_string(),
            ));
        }

        let n = x.nrows();
        let (pos_weight, neg_weight) = if config.balanced {
            balanced_class_weights(y)
        } else {
            (1.0, 1.0)
        };
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            min_child_weight: 0.0,
            max_features: Some(config.max_features.resolve(x.ncols())),
            lambda: 0.0,
        };

        let mut seeds = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        for tree_idx in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(seeds.gen());

            let mut counts = vec![0u32; n];
            if config.bootstrap {
                for _ in 0..n {
                    counts[rng.gen_range(0..n)] += 1;
                }
            } else {
                counts.fill(1);
            }

            let stats: Vec<ClassStats> = y
                .iter()
                .zip(&counts)
                .map(|(&label, &count)| {
                    let class_weight = if label == 1 { pos_weight } else { neg_weight };
                    ClassStats::new(label, class_weight * f64::from(count))
                })
                .collect();
            let rows: Vec<usize> = (0..n).filter(|&i| counts[i] > 0).collect();

            let tree = TreeBuilder::new(x, &stats, &tree_config).build(&rows, &mut rng);
            tracing::trace!(
                tree = tree_idx + 1,
                leaves = tree.n_leaves(),
                "random forest tree built"
            );
            trees.push(tree);
        }

        tracing::debug!(n_trees = trees.len(), "random forest fitted");
        Ok(FittedRandomForest {
            n_features: x.ncols(),
            trees,
        })
    }
}

/// Persisted form of a [`FittedRandomForest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FittedRandomForest {
    n_features: usize,
    trees: Vec<Tree>,
}

impl FittedRandomForest {
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn extract_params(&self) -> ForestParams {
        ForestParams {
            n_features: self.n_features,
            trees: self.trees.clone(),
        }
    }

    pub fn from_params(params: ForestParams) -> Result<Self, ModelError> {
        if params.n_features == 0 || params.trees.is_empty() {
            return Err(ModelError::InvalidModel(
                "random forest has no features or no trees".to_string(),
            ));
        }
        for tree in &params.trees {
            tree.validate(params.n_features)?;
        }
        Ok(Self {
            n_features: params.n_features,
            trees: params.trees,
        })
    }
}

impl Classifier for FittedRandomForest {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(x)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    /// Majority vote over the averaged class probabilities; an exact tie is
    /// class 0.
    fn predict(&self, x: ArrayView1<f64>) -> u8 {
        u8::from(self.predict_proba(x) > 0.5)
    }
}
