//! Training and serving configuration.
//!
//! Both configs have usable defaults, can be read from a TOML file, and are
//! then overridden field by field by the command-line flags of the binaries.

use crate::model::{default_candidates, CandidateSpec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATA_PATH: &str = "data/Telco-Customer-Churn.csv";
pub const DEFAULT_ARTIFACTS_DIR: &str = "models";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings of the `churn-train` job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Historical customer table (CSV with header).
    pub data: PathBuf,
    /// Directory receiving `best_model.bin` and `encoders.bin`.
    pub artifacts_dir: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    /// Models to compare, in order. Ties on F1 go to the earliest.
    pub candidates: Vec<CandidateSpec>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA_PATH),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            test_fraction: 0.25,
            seed: 42,
            candidates: default_candidates(),
        }
    }
}

impl TrainConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.candidates.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one candidate model is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of the `churn-serve` process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub artifacts_dir: PathBuf,
    pub bind: SocketAddr,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

impl ServeConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_toml(path.as_ref())
    }
}
