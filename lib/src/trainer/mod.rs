//! Mini-batch gradient descent for the gradient-trained churn models.

use crate::{
    dataset::Dataset,
    loss::Loss,
    model::{ModelError, ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use ndarray::{Array1, Array2};
use std::marker::PhantomData;

/// Epoch loop over a [`Dataset`]: forward, loss, backward, regularize, step.
///
/// `fit` consumes the unfitted model and hands back its fitted form.
pub struct Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub(crate) batch_size: usize,
    pub(crate) max_epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

/// Builder for [`Trainer`]. Defaults to 32-row batches, 1000 epochs, verbose.
pub struct TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    batch_size: usize,
    max_epochs: usize,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, P, R> TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: 32,
            max_epochs: 1000,
            verbose: true,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Emit a `debug` event with the mean loss after every epoch.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss<Target = Array1<f64>, Prediction = Array1<f64>>,
    M: TrainableModel<Input = Array2<f64>, Prediction = L::Prediction, Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
    P: ParamOps,
{
    /// Run `max_epochs` passes over `dataset`.
    ///
    /// The dataset must report its length; the per-epoch loss is the
    /// row-weighted mean over batches. A non-finite loss aborts training.
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<M::Output, ModelError>
    where
        D: Dataset,
    {
        let n_total = dataset
            .len()
            .ok_or_else(|| ModelError::Training("dataset length unknown".to_string()))?;
        if n_total == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidHyperparameter(
                "batch_size must be positive".to_string(),
            ));
        }

        let mut avg_loss = f64::NAN;
        for epoch in 0..self.max_epochs {
            let mut total_loss = 0.0;
            for batch_result in dataset.batches(self.batch_size) {
                let (batch_x, batch_y) = batch_result
                    .map_err(|e| ModelError::Training(format!("data error: {:?}", e)))?;
                let batch_len = batch_y.len() as f64;

                let preds = model.forward(&batch_x);
                let (reg_penalty, reg_grad) = self.regularizer.regularizer_penalty_grad(&model);
                total_loss += (self.loss_fn.loss(&preds, &batch_y) + reg_penalty) * batch_len;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&batch_x, &grad_preds);
                let total_grads = grads.add(&reg_grad);
                let new_params = self.optimizer.step(model.params(), &total_grads);
                model.update_params(&new_params);
            }

            avg_loss = total_loss / n_total as f64;
            if !avg_loss.is_finite() {
                return Err(ModelError::Training(format!(
                    "loss diverged at epoch {}",
                    epoch
                )));
            }
            if self.verbose {
                tracing::debug!(epoch, loss = avg_loss, "epoch finished");
            }
        }

        tracing::debug!(epochs = self.max_epochs, final_loss = avg_loss, "training finished");
        Ok(model.into_fitted())
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, P, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::InMemoryDataset,
        loss::BCEWithLogitsLoss,
        model::{Classifier, LogisticRegression},
        optimizer::SGD,
        regularizers::{NoRegularizer, L2},
    };
    use ndarray::array;

    type LogisticBuilder<R> =
        TrainerBuilder<BCEWithLogitsLoss, SGD, LogisticRegression, crate::model::LogisticParams, R>;

    fn builder() -> LogisticBuilder<NoRegularizer> {
        TrainerBuilder::new(BCEWithLogitsLoss::new(), SGD::new(0.1), NoRegularizer)
    }

    // y = 1 when x > 0
    fn threshold_dataset() -> InMemoryDataset {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        InMemoryDataset::new(x, y).unwrap()
    }

    #[test]
    fn test_trainer_builder_default_values() {
        let builder = builder();
        assert_eq!(builder.batch_size, 32);
        assert_eq!(builder.max_epochs, 1000);
        assert!(builder.verbose);
    }

    #[test]
    fn test_trainer_builder_chaining() {
        let trainer = builder()
            .batch_size(128)
            .max_epochs(250)
            .verbose(false)
            .build();

        assert_eq!(trainer.batch_size, 128);
        assert_eq!(trainer.max_epochs, 250);
        assert!(!trainer.verbose);
    }

    #[test]
    fn test_trainer_fit_logistic_regression() {
        let trainer = Trainer::builder(BCEWithLogitsLoss::new(), SGD::new(0.5), NoRegularizer)
            .batch_size(4)
            .max_epochs(300)
            .verbose(false)
            .build();

        let fitted = trainer
            .fit(LogisticRegression::new(1), &threshold_dataset())
            .unwrap();

        assert!(fitted.params().weights[0] > 0.0);
        assert_eq!(fitted.predict(array![1.2].view()), 1);
        assert_eq!(fitted.predict(array![-1.2].view()), 0);
        assert!(fitted.predict_proba(array![2.0].view()) > 0.8);
    }

    #[test]
    fn test_trainer_with_l2_regularization() {
        let fit = |lambda: f64| {
            let trainer = Trainer::builder(BCEWithLogitsLoss::new(), SGD::new(0.5), L2::new(lambda))
                .batch_size(8)
                .max_epochs(300)
                .verbose(false)
                .build();
            trainer
                .fit(LogisticRegression::new(1), &threshold_dataset())
                .unwrap()
                .params()
                .weights[0]
        };

        let free = fit(0.0);
        let shrunk = fit(0.5);
        assert!(shrunk > 0.0);
        assert!(shrunk < free);
    }

    #[test]
    fn test_trainer_zero_batch_size() {
        let trainer = builder().batch_size(0).verbose(false).build();
        let result = trainer.fit(LogisticRegression::new(1), &threshold_dataset());
        assert!(matches!(result, Err(ModelError::InvalidHyperparameter(_))));
    }

    #[test]
    fn test_trainer_unknown_dataset_length() {
        struct Unsized;

        impl Dataset for Unsized {
            type Error = String;

            fn len(&self) -> Option<usize> {
                None
            }

            fn get_batch(
                &self,
                _range: std::ops::Range<usize>,
            ) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
                Err("no data".into())
            }
        }

        let trainer = builder().batch_size(1).max_epochs(1).build();
        let result = trainer.fit(LogisticRegression::new(1), &Unsized);
        assert!(matches!(result, Err(ModelError::Training(_))));
    }
}
