//! Error types for preprocessing operations.

use thiserror::Error;

/// Per-record encoding failure.
///
/// Every variant means "this input is invalid", never "the encoder is broken",
/// so callers at the serving boundary can map it straight to a client error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// A binary field held something other than its two accepted strings.
    #[error("unrecognized binary value {value:?} for field {field}")]
    UnrecognizedBinaryValue { field: &'static str, value: String },
    /// A categorical field held a value never seen during fitting.
    #[error("unknown category {value:?} for field {field}")]
    UnknownCategoryValue { field: &'static str, value: String },
    /// A code outside `[0, k)` was passed to a decoder.
    #[error("code {code} out of range for field {field} ({n_classes} classes)")]
    UnknownCode {
        field: &'static str,
        code: usize,
        n_classes: usize,
    },
    /// A row or matrix had the wrong number of feature columns.
    #[error("expected {expected} feature values, got {got}")]
    WidthMismatch { expected: usize, got: usize },
}

/// Error type for fitting, assembling and persisting preprocessing state.
#[derive(Debug, Error)]
pub enum PreprocessingError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Table columns do not match the expected feature set.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}
