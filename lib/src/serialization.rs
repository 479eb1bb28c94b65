//! Serialization of fitted parameters and the on-disk artifact envelope.
//!
//! Fitted state is converted to plain parameter structs (see
//! [`SerializableParams`]) and then wrapped in an [`ArtifactEnvelope`] that
//! records what kind of artifact the file holds and which format version wrote
//! it. Loading the classifier file where the encoder file was expected fails
//! loudly instead of decoding garbage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// File name of the persisted classifier inside an artifact directory.
pub const MODEL_FILE: &str = "best_model.bin";

/// File name of the persisted feature pipeline (encoders + frozen median).
pub const ENCODERS_FILE: &str = "encoders.bin";

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain data (e.g., `Vec<f64>`, strings),
/// not caches derived from it.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// What an artifact file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Classifier,
    FeaturePipeline,
}

/// Header + payload written to disk for every artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub payload: Vec<u8>,
}

/// Failure to write or read a persisted artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("{path:?} holds a {found:?} artifact, expected {expected:?}")]
    WrongKind {
        path: PathBuf,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("{path:?} has format version {found}, this build reads version {FORMAT_VERSION}")]
    UnsupportedVersion { path: PathBuf, found: u32 },
    #[error("Incompatible artifacts: {0}")]
    Incompatible(String),
    #[error("Artifacts already initialized")]
    AlreadyInitialized,
}

/// Serialize `params` and write them to `path` under the given kind.
pub fn save_artifact<T: SerializableParams<Error = bincode::Error>>(
    path: &Path,
    kind: ArtifactKind,
    params: &T,
) -> Result<(), ArtifactError> {
    let envelope = ArtifactEnvelope {
        format_version: FORMAT_VERSION,
        kind,
        payload: params.to_bytes()?,
    };
    let bytes = envelope.to_bytes()?;
    std::fs::write(path, bytes).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and check an artifact envelope, then decode its payload.
pub fn load_artifact<T: SerializableParams<Error = bincode::Error>>(
    path: &Path,
    kind: ArtifactKind,
) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope = ArtifactEnvelope::from_bytes(&bytes)?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: envelope.format_version,
        });
    }
    if envelope.kind != kind {
        return Err(ArtifactError::WrongKind {
            path: path.to_path_buf(),
            expected: kind,
            found: envelope.kind,
        });
    }
    Ok(T::from_bytes(&envelope.payload)?)
}

/// Locations of the two artifacts the inference service depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            encoders: dir.join(ENCODERS_FILE),
        }
    }
}
