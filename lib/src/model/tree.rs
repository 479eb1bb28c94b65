//! CART decision trees shared by the forest and the boosted ensemble.
//!
//! Trees are stored as a flat arena of [`Node`]s with the root at index 0.
//! Splits send `x[feature] <= threshold` to the left child. Construction is
//! exact-greedy: every distinct value of every candidate feature is tried, the
//! highest gain wins, and ties keep the first candidate found (lowest feature
//! position, then lowest threshold), so the same data and seed always give the
//! same tree.
//!
//! What a split optimizes is abstracted by [`SplitStats`]:
//! - [`ClassStats`]: weighted Gini impurity, leaf = positive-class fraction
//! - [`GradStats`]: second-order gain `G²/(H+λ)`, leaf = `-G/(H+λ)`

use crate::model::ModelError;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Node of a fitted tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted decision tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Wrap a raw node arena. Call [`Tree::validate`] before evaluating it.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Leaf value reached by `x`.
    pub fn evaluate(&self, x: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Multiply every leaf value by `factor`.
    pub fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    /// Check that a deserialized tree is well formed for `n_features` inputs.
    ///
    /// Children must point strictly forward, which also rules out cycles.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidModel("tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(ModelError::InvalidModel(format!(
                        "leaf {} has non-finite value",
                        i
                    )));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(ModelError::InvalidModel(format!(
                            "node {} splits on feature {} of {}",
                            i, feature, n_features
                        )));
                    }
                    let in_range = |c: usize| c > i && c < self.nodes.len();
                    if !in_range(*left) || !in_range(*right) {
                        return Err(ModelError::InvalidModel(format!(
                            "node {} has out-of-range children",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Growth limits for a single tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Minimum [`SplitStats::weight`] on each side of a split.
    pub min_child_weight: f64,
    /// Features tried per node; `None` tries all of them.
    pub max_features: Option<usize>,
    /// L2 penalty on leaf values (gradient trees only).
    pub lambda: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            max_features: None,
            lambda: 0.0,
        }
    }
}

/// Additive per-sample statistics that drive split selection.
pub trait SplitStats: Copy + Default {
    fn add(&mut self, other: &Self);
    fn sub(&self, other: &Self) -> Self;
    /// Node score; split gain is `score(left) + score(right) - score(parent)`.
    fn score(&self, lambda: f64) -> f64;
    fn leaf_value(&self, lambda: f64) -> f64;
    fn weight(&self) -> f64;
}

/// Weighted class counts for Gini splits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassStats {
    pub positive: f64,
    pub total: f64,
}

impl ClassStats {
    pub fn new(label: u8, weight: f64) -> Self {
        Self {
            positive: if label == 1 { weight } else { 0.0 },
            total: weight,
        }
    }
}

impl SplitStats for ClassStats {
    fn add(&mut self, other: &Self) {
        self.positive += other.positive;
        self.total += other.total;
    }

    fn sub(&self, other: &Self) -> Self {
        Self {
            positive: self.positive - other.positive,
            total: self.total - other.total,
        }
    }

    // Negative weighted Gini impurity: -total * (1 - p² - q²) = -2·pos·neg / total
    fn score(&self, _lambda: f64) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        -2.0 * self.positive * (self.total - self.positive) / self.total
    }

    fn leaf_value(&self, _lambda: f64) -> f64 {
        if self.total <= 0.0 {
            0.0
        } else {
            self.positive / self.total
        }
    }

    fn weight(&self) -> f64 {
        self.total
    }
}

/// Gradient and hessian sums for second-order boosting splits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradStats {
    pub gradient: f64,
    pub hessian: f64,
}

impl SplitStats for GradStats {
    fn add(&mut self, other: &Self) {
        self.gradient += other.gradient;
        self.hessian += other.hessian;
    }

    fn sub(&self, other: &Self) -> Self {
        Self {
            gradient: self.gradient - other.gradient,
            hessian: self.hessian - other.hessian,
        }
    }

    fn score(&self, lambda: f64) -> f64 {
        let denom = self.hessian + lambda;
        if denom <= 0.0 {
            0.0
        } else {
            self.gradient * self.gradient / denom
        }
    }

    fn leaf_value(&self, lambda: f64) -> f64 {
        let denom = self.hessian + lambda;
        if denom <= 0.0 {
            0.0
        } else {
            -self.gradient / denom
        }
    }

    fn weight(&self) -> f64 {
        self.hessian
    }
}

const MIN_GAIN: f64 = 1e-12;

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Exact-greedy CART builder over a feature matrix and per-row statistics.
pub struct TreeBuilder<'x, 'a, S: SplitStats> {
    x: ArrayView2<'x, f64>,
    stats: &'a [S],
    config: &'a TreeConfig,
}

impl<'x, 'a, S: SplitStats> TreeBuilder<'x, 'a, S> {
    pub fn new(x: ArrayView2<'x, f64>, stats: &'a [S], config: &'a TreeConfig) -> Self {
        debug_assert_eq!(x.nrows(), stats.len());
        Self { x, stats, config }
    }

    /// Grow a tree over the given rows. `rng` drives per-node feature sampling.
    pub fn build(&self, rows: &[usize], rng: &mut StdRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(rows, 0, &mut nodes, rng);
        Tree { nodes }
    }

    fn total(&self, rows: &[usize]) -> S {
        let mut total = S::default();
        for &i in rows {
            total.add(&self.stats[i]);
        }
        total
    }

    fn build_node(
        &self,
        rows: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut StdRng,
    ) -> usize {
        let current = nodes.len();
        let total = self.total(rows);
        let leaf = Node::Leaf {
            value: total.leaf_value(self.config.lambda),
        };

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        let min_split = self
            .config
            .min_samples_split
            .max(2 * self.config.min_samples_leaf);
        if depth_reached || rows.len() < min_split {
            nodes.push(leaf);
            return current;
        }

        let Some(split) = self.find_best_split(rows, &total, rng) else {
            nodes.push(leaf);
            return current;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);

        // Reserve the slot, then patch child indices once they exist
        nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let left = self.build_node(&left_rows, depth + 1, nodes, rng);
        let right = self.build_node(&right_rows, depth + 1, nodes, rng);
        if let Node::Split {
            left: l, right: r, ..
        } = &mut nodes[current]
        {
            *l = left;
            *r = right;
        }
        current
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.config.max_features {
            Some(k) if k < n_features => {
                let mut features = rand::seq::index::sample(rng, n_features, k.max(1)).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..n_features).collect(),
        }
    }

    fn find_best_split(&self, rows: &[usize], total: &S, rng: &mut StdRng) -> Option<SplitCandidate> {
        let lambda = self.config.lambda;
        let parent_score = total.score(lambda);
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;

        for feature in self.candidate_features(rng) {
            let mut order = rows.to_vec();
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = S::default();
            for k in 0..order.len() - 1 {
                left.add(&self.stats[order[k]]);
                let value = self.x[[order[k], feature]];
                let next = self.x[[order[k + 1], feature]];
                if value == next {
                    continue;
                }
                let n_left = k + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }
                let right = total.sub(&left);
                if left.weight() < self.config.min_child_weight
                    || right.weight() < self.config.min_child_weight
                {
                    continue;
                }

                let gain = left.score(lambda) + right.score(lambda) - parent_score;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::SeedableRng;

    fn class_stats(labels: &[u8]) -> Vec<ClassStats> {
        labels.iter().map(|&l| ClassStats::new(l, 1.0)).collect()
    }

    #[test]
    fn test_single_split_separates_classes() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let stats = class_stats(&[0, 0, 1, 1]);
        let config = TreeConfig::default();
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1, 2, 3], &mut StdRng::seed_from_u64(0));

        assert_eq!(
            tree.nodes()[0],
            Node::Split {
                feature: 0,
                threshold: 2.5,
                left: 1,
                right: 2
            }
        );
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.evaluate(array![1.5, 0.0].view()), 0.0);
        assert_eq!(tree.evaluate(array![3.5, 0.0].view()), 1.0);
        assert!(tree.validate(2).is_ok());
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let stats = class_stats(&[1, 1, 1]);
        let config = TreeConfig::default();
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1, 2], &mut StdRng::seed_from_u64(0));

        assert_eq!(tree.nodes(), &[Node::Leaf { value: 1.0 }]);
    }

    // Same shape as the forest and boosting call sites: the view comes from the
    // caller, the statistics and config are owned by the function.
    fn build_with_local_stats(x: ArrayView2<f64>, labels: &[u8]) -> Tree {
        let stats = class_stats(labels);
        let config = TreeConfig::default();
        let rows: Vec<usize> = (0..x.nrows()).collect();
        TreeBuilder::new(x, &stats, &config).build(&rows, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_builder_accepts_caller_view_with_local_stats() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let tree = build_with_local_stats(x.view(), &[0, 0, 1, 1]);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.evaluate(array![4.0].view()), 1.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
        let stats = class_stats(&[0, 1, 0, 1, 0, 1, 0, 1]);
        let config = TreeConfig {
            max_depth: Some(1),
            ..TreeConfig::default()
        };
        let rows: Vec<usize> = (0..8).collect();
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&rows, &mut StdRng::seed_from_u64(0));

        assert!(tree.n_leaves() <= 2);
    }

    #[test]
    fn test_class_weights_shift_leaf_value() {
        let x = array![[1.0], [1.0], [1.0]];
        let stats = vec![
            ClassStats::new(0, 1.0),
            ClassStats::new(0, 1.0),
            ClassStats::new(1, 2.0),
        ];
        let config = TreeConfig::default();
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1, 2], &mut StdRng::seed_from_u64(0));

        assert_eq!(tree.evaluate(array![1.0].view()), 0.5);
    }

    #[test]
    fn test_gradient_leaf_values() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let stats = vec![
            GradStats { gradient: -1.0, hessian: 1.0 },
            GradStats { gradient: -1.0, hessian: 1.0 },
            GradStats { gradient: 1.0, hessian: 1.0 },
            GradStats { gradient: 1.0, hessian: 1.0 },
        ];
        let config = TreeConfig {
            lambda: 1.0,
            ..TreeConfig::default()
        };
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1, 2, 3], &mut StdRng::seed_from_u64(0));

        // -G / (H + λ) = 2 / 3 on the left, -2 / 3 on the right
        assert!((tree.evaluate(array![1.0].view()) - 2.0 / 3.0).abs() < 1e-12);
        assert!((tree.evaluate(array![4.0].view()) + 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let stats = class_stats(&[1, 0, 0, 0]);
        let config = TreeConfig {
            min_samples_leaf: 2,
            ..TreeConfig::default()
        };
        let tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1, 2, 3], &mut StdRng::seed_from_u64(0));

        if let Node::Split { threshold, .. } = tree.nodes()[0] {
            assert_eq!(threshold, 2.5);
        } else {
            panic!("expected a split");
        }
    }

    #[test]
    fn test_scale_leaves() {
        let x = array![[1.0], [2.0]];
        let stats = class_stats(&[0, 1]);
        let config = TreeConfig::default();
        let mut tree = TreeBuilder::new(x.view(), &stats, &config)
            .build(&[0, 1], &mut StdRng::seed_from_u64(0));
        tree.scale_leaves(0.5);
        assert_eq!(tree.evaluate(array![2.0].view()), 0.5);
    }

    #[test]
    fn test_validate_rejects_bad_trees() {
        let backwards = Tree {
            nodes: vec![
                Node::Leaf { value: 0.0 },
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 0,
                },
            ],
        };
        assert!(backwards.validate(1).is_err());

        let wide = Tree {
            nodes: vec![
                Node::Split {
                    feature: 3,
                    threshold: 1.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 0.0 },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(wide.validate(3).is_err());
        assert!(wide.validate(4).is_ok());
        assert!(Tree { nodes: vec![] }.validate(1).is_err());
    }
}
