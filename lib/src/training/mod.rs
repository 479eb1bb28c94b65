//! End-to-end training job.
//!
//! Loads the historical table, fits the feature pipeline over all of it,
//! splits stratified, fits every candidate on the training half, scores it on
//! the held-out half and keeps the best F1. The winner and the pipeline are
//! written as the two serving artifacts.

use crate::config::{ConfigError, TrainConfig};
use crate::dataset::{stratified_split, ChurnTable, DatasetError, SplitIndices, TableSummary};
use crate::metrics::ClassificationMetrics;
use crate::model::{Classifier, FittedClassifier, ModelError, ModelKind};
use crate::preprocessing::{EncodingError, FeaturePipeline, FittedFeaturePipeline, PreprocessingError};
use crate::serialization::{ArtifactError, ArtifactPaths};
use ndarray::{Array2, Axis};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error("Feature assembly failed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Candidate {kind} failed: {source}")]
    Model {
        kind: ModelKind,
        #[source]
        source: ModelError,
    },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Failed to create artifact directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Held-out scores of one candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateResult {
    pub kind: ModelKind,
    pub metrics: ClassificationMetrics,
}

/// Everything a training run produced.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub summary: TableSummary,
    pub train_rows: usize,
    pub test_rows: usize,
    pub pipeline: FittedFeaturePipeline,
    pub model: FittedClassifier,
    /// One entry per candidate, in configured order.
    pub results: Vec<CandidateResult>,
    /// Index into `results` of the selected model.
    pub selected: usize,
}

impl TrainingOutcome {
    pub fn selected_result(&self) -> &CandidateResult {
        &self.results[self.selected]
    }

    pub fn comparison(&self) -> ModelComparison<'_> {
        ModelComparison(&self.results)
    }

    /// Write `best_model.bin` and `encoders.bin` into `dir`, creating it if needed.
    pub fn persist<P: AsRef<Path>>(&self, dir: P) -> Result<ArtifactPaths, TrainingError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| TrainingError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let paths = ArtifactPaths::in_dir(dir);
        self.model.save(&paths.model)?;
        self.pipeline.save(&paths.encoders)?;
        tracing::info!(
            model = %paths.model.display(),
            encoders = %paths.encoders.display(),
            "saved artifacts"
        );
        Ok(paths)
    }
}

/// Fixed-width comparison table of candidate scores.
pub struct ModelComparison<'a>(&'a [CandidateResult]);

impl fmt::Display for ModelComparison<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<22} {:>9} {:>9} {:>9} {:>9}",
            "model", "accuracy", "precision", "recall", "f1"
        )?;
        for r in self.0 {
            write!(
                f,
                "\n{:<22} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
                r.kind.name(),
                r.metrics.accuracy,
                r.metrics.precision,
                r.metrics.recall,
                r.metrics.f1
            )?;
        }
        Ok(())
    }
}

/// Index of the highest F1; the earliest wins ties.
pub fn select_best(results: &[CandidateResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        if best.map_or(true, |b| r.metrics.f1 > results[b].metrics.f1) {
            best = Some(i);
        }
    }
    best
}

fn take_rows(x: &Array2<f64>, y: &[u8], rows: &[usize]) -> (Array2<f64>, Vec<u8>) {
    (x.select(Axis(0), rows), rows.iter().map(|&i| y[i]).collect())
}

pub struct TrainingDriver {
    config: TrainConfig,
}

impl TrainingDriver {
    pub fn new(config: TrainConfig) -> Result<Self, TrainingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Load the configured table, train, and persist the artifacts.
    pub fn run(&self) -> Result<(TrainingOutcome, ArtifactPaths), TrainingError> {
        let table = ChurnTable::from_path(&self.config.data)?;
        let outcome = self.train(&table)?;
        let paths = outcome.persist(&self.config.artifacts_dir)?;
        Ok((outcome, paths))
    }

    /// Train and select on an already loaded table. Nothing is written.
    pub fn train(&self, table: &ChurnTable) -> Result<TrainingOutcome, TrainingError> {
        let pipeline = FeaturePipeline::new(table.columns().to_vec())?;
        let (fitted, x) = pipeline.fit_transform(table.records())?;
        let labels = table.labels();
        tracing::info!(rows = x.nrows(), features = x.ncols(), "assembled feature matrix");

        let SplitIndices { train, test } =
            stratified_split(labels, self.config.test_fraction, self.config.seed)?;
        let (x_train, y_train) = take_rows(&x, labels, &train);
        let (x_test, y_test) = take_rows(&x, labels, &test);
        tracing::info!(train = train.len(), test = test.len(), "stratified split");

        let mut results = Vec::with_capacity(self.config.candidates.len());
        let mut models = Vec::with_capacity(self.config.candidates.len());
        for spec in &self.config.candidates {
            let kind = spec.kind();
            tracing::info!(model = %kind, "fitting candidate");
            let model = spec
                .fit(x_train.view(), &y_train)
                .map_err(|source| TrainingError::Model { kind, source })?;
            let predictions = model.predict_batch(x_test.view());
            let metrics = ClassificationMetrics::compute(&y_test, &predictions);
            tracing::info!(
                model = %kind,
                accuracy = metrics.accuracy,
                precision = metrics.precision,
                recall = metrics.recall,
                f1 = metrics.f1,
                "candidate scored"
            );
            results.push(CandidateResult { kind, metrics });
            models.push(model);
        }

        let selected = select_best(&results).ok_or_else(|| {
            TrainingError::Config(ConfigError::Invalid(
                "at least one candidate model is required".to_string(),
            ))
        })?;
        let model = models.swap_remove(selected);

        let outcome = TrainingOutcome {
            summary: table.summary(),
            train_rows: train.len(),
            test_rows: test.len(),
            pipeline: fitted,
            model,
            results,
            selected,
        };
        let best = outcome.selected_result();
        tracing::info!("model comparison\n{}", outcome.comparison());
        tracing::info!(
            "classification report for {}\n{}",
            best.kind,
            best.metrics.report()
        );
        tracing::info!(model = %best.kind, f1 = best.metrics.f1, "selected best model");
        Ok(outcome)
    }
}
