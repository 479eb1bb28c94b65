//! Single-record inference over the persisted artifacts.
//!
//! The artifacts are loaded once and shared read-only. Each request is
//! validated against the frozen encoders, assembled exactly as the training
//! rows were, and scored by the selected classifier.

use crate::model::{Classifier, FittedClassifier, ModelKind};
use crate::preprocessing::encoding::binary;
use crate::preprocessing::{EncodingError, FittedFeaturePipeline};
use crate::schema::{BinaryField, CustomerRecord};
use crate::serialization::{ArtifactError, ArtifactPaths};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub mod http;

/// The feature pipeline and classifier the service runs on.
#[derive(Debug)]
pub struct LoadedArtifacts {
    pipeline: FittedFeaturePipeline,
    model: FittedClassifier,
}

impl LoadedArtifacts {
    /// Pair a pipeline with a classifier; their feature widths must agree.
    pub fn new(
        pipeline: FittedFeaturePipeline,
        model: FittedClassifier,
    ) -> Result<Self, ArtifactError> {
        if pipeline.n_features() != model.n_features() {
            return Err(ArtifactError::Incompatible(format!(
                "pipeline produces {} features but the {} model expects {}",
                pipeline.n_features(),
                model.kind(),
                model.n_features()
            )));
        }
        Ok(Self { pipeline, model })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let pipeline = FittedFeaturePipeline::load(&paths.encoders)?;
        let model = FittedClassifier::load(&paths.model)?;
        let artifacts = Self::new(pipeline, model)?;
        tracing::info!(
            model = %artifacts.model.kind(),
            features = artifacts.pipeline.n_features(),
            "loaded artifacts"
        );
        Ok(artifacts)
    }

    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ArtifactError> {
        Self::load(&ArtifactPaths::in_dir(dir))
    }

    pub fn pipeline(&self) -> &FittedFeaturePipeline {
        &self.pipeline
    }

    pub fn model(&self) -> &FittedClassifier {
        &self.model
    }
}

static ARTIFACTS: OnceCell<Arc<LoadedArtifacts>> = OnceCell::new();

/// Install the process-wide artifacts. Fails if they were already set.
pub fn init_artifacts(artifacts: LoadedArtifacts) -> Result<Arc<LoadedArtifacts>, ArtifactError> {
    let shared = Arc::new(artifacts);
    ARTIFACTS
        .set(Arc::clone(&shared))
        .map_err(|_| ArtifactError::AlreadyInitialized)?;
    Ok(shared)
}

/// The process-wide artifacts, if [`init_artifacts`] has run.
pub fn artifacts() -> Option<Arc<LoadedArtifacts>> {
    ARTIFACTS.get().cloned()
}

/// Response of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(rename = "churn_prediction")]
    pub label: &'static str,
    /// Positive-class probability rounded to 3 decimals.
    #[serde(rename = "churn_probability")]
    pub probability: f64,
}

/// Model identity reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub model: ModelKind,
    pub n_features: usize,
}

fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone)]
pub struct InferenceService {
    artifacts: Arc<LoadedArtifacts>,
}

impl InferenceService {
    pub fn new(artifacts: Arc<LoadedArtifacts>) -> Self {
        Self { artifacts }
    }

    /// Service over the process-wide artifacts.
    pub fn from_global() -> Option<Self> {
        artifacts().map(Self::new)
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            model: self.artifacts.model.kind(),
            n_features: self.artifacts.pipeline.n_features(),
        }
    }

    pub fn predict(&self, record: &CustomerRecord) -> Result<Prediction, EncodingError> {
        let pipeline = &self.artifacts.pipeline;
        pipeline.validate(record)?;
        let features = pipeline.assemble(record)?;

        let model = &self.artifacts.model;
        let probability = model.predict_proba(features.view());
        let label = model.predict(features.view());
        Ok(Prediction {
            label: binary::inverse(BinaryField::Churn, label),
            probability: round3(probability),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{fitted_artifacts, service};
    use super::*;
    use crate::schema::fixtures::sample_record;
    use crate::schema::MonetaryValue;

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(round3(0.0), 0.0);
    }

    #[test]
    fn test_predict_sample_record() {
        let prediction = service().predict(&sample_record()).unwrap();
        assert!(prediction.label == "Yes" || prediction.label == "No");
        assert!((0.0..=1.0).contains(&prediction.probability));
        assert_eq!(round3(prediction.probability), prediction.probability);
    }

    #[test]
    fn test_blank_total_charges_uses_median() {
        let service = service();
        let mut record = sample_record();
        record.total_charges = MonetaryValue::Text(String::new());
        let blank = service.predict(&record).unwrap();

        record.total_charges = MonetaryValue::Number(service.artifacts.pipeline.coercion().median());
        let median = service.predict(&record).unwrap();
        assert_eq!(blank, median);
    }

    #[test]
    fn test_unknown_gender_then_recovery() {
        let service = service();
        let mut record = sample_record();
        record.gender = "Other".into();
        assert!(matches!(
            service.predict(&record),
            Err(EncodingError::UnrecognizedBinaryValue { field: "gender", .. })
        ));
        assert!(service.predict(&sample_record()).is_ok());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut record = sample_record();
        record.contract = "Three year".into();
        assert!(matches!(
            service().predict(&record),
            Err(EncodingError::UnknownCategoryValue { .. })
        ));
    }

    #[test]
    fn test_predictions_are_idempotent() {
        let service = service();
        let first = service.predict(&sample_record()).unwrap();
        for _ in 0..5 {
            assert_eq!(service.predict(&sample_record()).unwrap(), first);
        }
    }

    #[test]
    fn test_width_mismatch_rejected() {
        use crate::model::{LogisticClassifier, LogisticParams};
        let artifacts = fitted_artifacts();
        let narrow = LogisticClassifier::from_params(LogisticParams::zeros(3)).unwrap();
        assert!(matches!(
            LoadedArtifacts::new(artifacts.pipeline, narrow.into()),
            Err(ArtifactError::Incompatible(_))
        ));
    }

    #[test]
    fn test_load_dir_round_trip() {
        let artifacts = fitted_artifacts();
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        artifacts.model.save(&paths.model).unwrap();
        artifacts.pipeline.save(&paths.encoders).unwrap();

        let loaded = LoadedArtifacts::load_dir(dir.path()).unwrap();
        let original = InferenceService::new(Arc::new(artifacts));
        let restored = InferenceService::new(Arc::new(loaded));
        assert_eq!(
            original.predict(&sample_record()).unwrap(),
            restored.predict(&sample_record()).unwrap()
        );
    }

    // The only test that touches the process-wide artifacts.
    #[test]
    fn test_global_artifacts_install_once() {
        let installed = init_artifacts(fitted_artifacts()).unwrap();
        let shared = artifacts().unwrap();
        assert!(Arc::ptr_eq(&installed, &shared));

        let global = InferenceService::from_global().unwrap();
        let direct = InferenceService::new(installed);
        assert_eq!(
            global.predict(&sample_record()).unwrap(),
            direct.predict(&sample_record()).unwrap()
        );
        assert_eq!(global.info(), direct.info());

        assert!(matches!(
            init_artifacts(fitted_artifacts()),
            Err(ArtifactError::AlreadyInitialized)
        ));
        assert!(Arc::ptr_eq(&artifacts().unwrap(), &shared));
    }

    #[test]
    fn test_missing_artifacts_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LoadedArtifacts::load_dir(dir.path()),
            Err(ArtifactError::Io { .. })
        ));
    }
}
