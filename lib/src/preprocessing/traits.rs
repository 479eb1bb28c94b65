//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; frozen, applied value by value, serializable.
//!
//! The split is what makes train/serve parity possible: everything learned from
//! the training table lives in the fitted half, and the fitted half is the only
//! thing the serving process ever sees.

use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::serialization::SerializableParams;

/// Trait for unfitted transformers.
///
/// # Example
/// ```ignore
/// use telco_churn::preprocessing::{CategoricalEncoder, FittedTransformer, Transformer};
/// use telco_churn::schema::CategoricalField;
///
/// let fitted = CategoricalEncoder::new(CategoricalField::Contract).fit(&records)?;
/// let code = fitted.transform("Month-to-month")?;
/// ```
pub trait Transformer {
    /// Training data the transformer learns from.
    type Input: ?Sized;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer;

    /// Learn parameters from the full training data.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the data is empty or carries no usable values.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `transform` is pure: the same input always yields the same output.
pub trait FittedTransformer: Sized {
    /// A single raw value consumed by [`FittedTransformer::transform`].
    type Item: ?Sized;
    /// The encoded value.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform one value using the learned parameters.
    fn transform(&self, item: &Self::Item) -> Result<Self::Output, EncodingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>;
}
