//! Preprocessing: raw customer records to numeric features.
//!
//! Follows the same fit/frozen split as the models in this crate:
//!
//! - [`Transformer`]: unfitted, learns from the training table
//! - [`FittedTransformer`]: frozen, serializable, applied at serving time
//!
//! # Available Transformers
//!
//! ## Encoding
//! - [`encoding::binary`]: fixed two-valued field mapping
//! - [`CategoricalEncoder`]: sorted label encoding of one multi-valued field
//! - [`EncoderRegistry`]: one encoder per multi-valued field
//!
//! ## Imputation
//! - [`MonetaryCoercion`]: numeric coercion of `TotalCharges` with a frozen median
//!
//! ## Scaling
//! - [`StandardScaler`]: Z-score normalization (logistic model only)
//!
//! ## Pipeline
//! - [`FeaturePipeline`]: all of the above in a fixed column order
//!
//! # Example
//!
//! ```ignore
//! use telco_churn::preprocessing::{FeaturePipeline, FittedFeaturePipeline};
//!
//! let (fitted, matrix) = FeaturePipeline::default().fit_transform(&records)?;
//! fitted.save(Path::new("artifacts/encoders.bin"))?;
//!
//! let loaded = FittedFeaturePipeline::load(Path::new("artifacts/encoders.bin"))?;
//! let features = loaded.assemble(&records[0])?;
//! ```

pub mod encoding;
pub mod error;
pub mod imputation;
pub mod pipeline;
pub mod scaling;
pub mod traits;

// Re-export main types
pub use encoding::{
    CategoricalEncoder, CategoricalEncoderParams, EncodedColumns, EncoderRegistry,
    EncoderRegistryParams, FittedCategoricalEncoder,
};
pub use error::{EncodingError, PreprocessingError};
pub use imputation::{FittedMonetaryCoercion, MonetaryCoercion, MonetaryCoercionParams};
pub use pipeline::{FeaturePipeline, FeaturePipelineParams, FeatureVector, FittedFeaturePipeline};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
