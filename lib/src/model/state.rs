/// A marker type indicating that a model is **not yet trained**.
///
/// Training methods (like `Trainer::fit`) require an `Unfitted` model, and
/// prediction is not available until the model is converted to `Fitted`.
#[derive(Debug, Clone, Copy)]
pub struct Unfitted;

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model contains only inference parameters: no optimizer state,
/// loss function or training hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct Fitted;
