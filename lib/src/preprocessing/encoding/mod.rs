//! Categorical feature encoding.
//!
//! # Available Encoders
//!
//! ## Binary mapping
//! Fixed `"Yes"/"No"` (or `"Male"/"Female"`) → `{1, 0}` table for two-valued
//! fields. Nothing is fitted.
//!
//! ## CategoricalEncoder
//! Maps the categories of one multi-valued field to contiguous integer codes in
//! sorted order.
//!
//! ```ignore
//! // Fitted on ["Two year", "Month-to-month", "One year"]
//! // "Month-to-month" -> 0, "One year" -> 1, "Two year" -> 2
//! ```
//!
//! ## EncoderRegistry
//! One fitted [`CategoricalEncoder`] per multi-valued field, persisted as a unit.
//!
//! Values unseen at fit time are always an error; there is no fallback code.

pub mod binary;
mod label;
mod registry;

pub use label::{CategoricalEncoder, CategoricalEncoderParams, FittedCategoricalEncoder};
pub use registry::{EncodedColumns, EncoderRegistry, EncoderRegistryParams};
