//! Feature scaling transformers.

pub mod standard;

pub use standard::{FittedStandardScaler, StandardScaler, StandardScalerParams};
