use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// Optimizers are responsible for updating model parameters based on computed gradients.
/// Training logic (`Trainer`) is decoupled from parameter update logic, so any
/// model can be paired with any optimizer without dynamic dispatch.
///
/// # Type Parameters
/// * `P`: model parameters type (e.g., [`LogisticParams`](crate::model::LogisticParams))
///
/// # Example
/// ```rust
/// # use telco_churn::optimizer::{SGD, Optimizer};
/// # use telco_churn::model::LogisticParams;
/// # use ndarray::array;
/// let params = LogisticParams { weights: array![1.0, 2.0, 3.0], bias: 0.5 };
/// let gradients = LogisticParams { weights: array![0.1, -0.2, 0.05], bias: -0.01 };
/// let sgd = SGD::new(0.01);
/// let updated_params = sgd.step(&params, &gradients);
/// ```
pub trait Optimizer<P> {
    /// Performs an optimization step. Inputs are not mutated; a new
    /// parameter set is returned.
    fn step(&self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
/// where `η` is the learning rate and `∇L(θ)` is the loss gradient.
#[derive(Clone, Copy, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&self, params: &P, grads: &P) -> P {
        params.add(&grads.scale(-self.lr))
    }
}
