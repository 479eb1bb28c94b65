use ndarray::Array1;

/// A trait for differentiable loss functions used during model training.
///
/// Implementors must define:
/// - How to compute the scalar loss value (for logging/metrics).
/// - How to compute the gradient of the loss w.r.t. the model's predictions.
///
/// This gradient is passed to the model's `backward()` method to update parameters.
pub trait Loss {
    type Prediction;
    type Target;

    /// Computes the scalar loss value (for logging/metrics).
    fn loss(&self, prediction: &Self::Prediction, target: &Self::Target) -> f64;

    /// Computes the gradient of the loss w.r.t. the prediction: ∂L/∂pred.
    /// This is what gets passed to `model.backward()`.
    fn grad_wrt_prediction(
        &self,
        prediction: &Self::Prediction,
        target: &Self::Target,
    ) -> Self::Prediction;
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Per-class sample weights `n / (2 * n_class)`, as `(positive, negative)`.
///
/// Single-class (or empty) labels are left unweighted: `(1.0, 1.0)`.
pub fn balanced_class_weights(labels: &[u8]) -> (f64, f64) {
    let n = labels.len() as f64;
    let positives = labels.iter().filter(|&&l| l == 1).count() as f64;
    let negatives = n - positives;
    if positives == 0.0 || negatives == 0.0 {
        return (1.0, 1.0);
    }
    (n / (2.0 * positives), n / (2.0 * negatives))
}

/// Binary Cross-Entropy loss with logits input (numerically stable), with
/// optional per-class weights.
///
/// Computes: `L = w_t * -(t * log(σ(z)) + (1-t) * log(1 - σ(z)))`
/// using the stable formulation: `max(z,0) - z*t + log(1 + exp(-|z|))`
///
/// Gradient w.r.t. logits: `∂L/∂z = w_t * (σ(z) - t) / n`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BCEWithLogitsLoss {
    pos_weight: f64,
    neg_weight: f64,
}

impl Default for BCEWithLogitsLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl BCEWithLogitsLoss {
    /// Unweighted loss.
    pub fn new() -> Self {
        Self {
            pos_weight: 1.0,
            neg_weight: 1.0,
        }
    }

    pub fn with_class_weights(pos_weight: f64, neg_weight: f64) -> Self {
        Self {
            pos_weight,
            neg_weight,
        }
    }

    /// Weights inversely proportional to class frequency in `labels`.
    pub fn balanced(labels: &[u8]) -> Self {
        let (pos_weight, neg_weight) = balanced_class_weights(labels);
        Self::with_class_weights(pos_weight, neg_weight)
    }

    fn weight(&self, target: f64) -> f64 {
        if target >= 0.5 {
            self.pos_weight
        } else {
            self.neg_weight
        }
    }
}

impl Loss for BCEWithLogitsLoss {
    type Prediction = Array1<f64>;
    type Target = Array1<f64>;

    fn loss(&self, logits: &Array1<f64>, targets: &Array1<f64>) -> f64 {
        if logits.is_empty() {
            return 0.0;
        }
        let total: f64 = logits
            .iter()
            .zip(targets.iter())
            .map(|(&z, &t)| self.weight(t) * (z.max(0.0) - z * t + (-z.abs()).exp().ln_1p()))
            .sum();
        total / logits.len() as f64
    }

    fn grad_wrt_prediction(&self, logits: &Array1<f64>, targets: &Array1<f64>) -> Array1<f64> {
        let n = logits.len().max(1) as f64;
        logits
            .iter()
            .zip(targets.iter())
            .map(|(&z, &t)| self.weight(t) * (sigmoid(z) - t) / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(100.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bce_loss_value() {
        let loss = BCEWithLogitsLoss::new();
        let value = loss.loss(&array![0.0, 0.0], &array![1.0, 0.0]);
        assert!((value - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_bce_gradient() {
        let loss = BCEWithLogitsLoss::new();
        let grad = loss.grad_wrt_prediction(&array![0.0, 0.0], &array![1.0, 0.0]);
        assert!((grad[0] + 0.25).abs() < 1e-12);
        assert!((grad[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights() {
        // 1 positive, 3 negatives
        let (pos, neg) = balanced_class_weights(&[1, 0, 0, 0]);
        assert_eq!(pos, 2.0);
        assert!((neg - 4.0 / 6.0).abs() < 1e-12);

        let loss = BCEWithLogitsLoss::balanced(&[1, 0, 0, 0]);
        let grad = loss.grad_wrt_prediction(&array![0.0, 0.0], &array![1.0, 0.0]);
        assert!((grad[0] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_unweighted() {
        assert_eq!(balanced_class_weights(&[0, 0]), (1.0, 1.0));
        assert_eq!(balanced_class_weights(&[1, 1, 1]), (1.0, 1.0));
        assert_eq!(balanced_class_weights(&[]), (1.0, 1.0));
    }
}
