#![allow(dead_code)]

use std::path::PathBuf;
use telco_churn::config::TrainConfig;
use telco_churn::dataset::ChurnTable;
use telco_churn::model::{BoostingConfig, CandidateSpec, ForestConfig, LogisticConfig};
use telco_churn::CustomerRecord;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/telco_sample.csv")
}

pub fn fixture_table() -> ChurnTable {
    ChurnTable::from_path(fixture_path()).unwrap()
}

/// A record every fitted fixture pipeline accepts.
pub fn request_record() -> CustomerRecord {
    fixture_table().records()[1].clone()
}

/// Small ensembles so the suite stays fast.
pub fn quick_config(artifacts_dir: PathBuf) -> TrainConfig {
    TrainConfig {
        data: fixture_path(),
        artifacts_dir,
        candidates: vec![
            CandidateSpec::RandomForest(ForestConfig {
                n_trees: 20,
                ..Default::default()
            }),
            CandidateSpec::GradientBoosting(BoostingConfig {
                n_rounds: 20,
                ..Default::default()
            }),
            CandidateSpec::LogisticRegression(LogisticConfig {
                epochs: 50,
                ..Default::default()
            }),
        ],
        ..Default::default()
    }
}
