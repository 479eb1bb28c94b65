//! Feature assembly over records and tables.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FeaturePipeline`] | Column order; fits the encoders and the median |
//! | [`FittedFeaturePipeline`] | Frozen state; `validate`, `assemble`, `assemble_table` |

#[allow(clippy::module_inception)]
pub mod pipeline;

pub use pipeline::{FeaturePipeline, FeaturePipelineParams, FeatureVector, FittedFeaturePipeline};
