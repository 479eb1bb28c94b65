use crate::model::{LogisticParams, LogisticRegression, TrainableModel};

/// Penalty on model parameters added to the data loss during training.
///
/// Returns the penalty value (for loss reporting) and its gradient with
/// respect to the parameters.
pub trait Regularizer<M: TrainableModel> {
    fn regularizer_penalty_grad(&self, model: &M) -> (f64, M::Gradients);
}

/// `lambda * ||w||²`. The bias is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer<LogisticRegression> for L2 {
    fn regularizer_penalty_grad(&self, model: &LogisticRegression) -> (f64, LogisticParams) {
        let params = model.params();
        let penalty = self.lambda * params.weights.dot(&params.weights);
        let grad = LogisticParams {
            weights: &params.weights * (2.0 * self.lambda),
            bias: 0.0,
        };
        (penalty, grad)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LogisticRegression> for NoRegularizer {
    fn regularizer_penalty_grad(&self, model: &LogisticRegression) -> (f64, LogisticParams) {
        (0.0, LogisticParams::zeros(model.params().weights.len()))
    }
}
