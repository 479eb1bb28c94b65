//! Dataset abstractions for training.
//!
//! - [`ChurnTable`]: the historical customer table loaded from CSV
//! - [`stratified_split`]: label-preserving train/test split
//! - [`Dataset`] / [`InMemoryDataset`]: `(X, y)` batches for the gradient trainer
//!
//! # Example
//!
//! ```ignore
//! use telco_churn::dataset::{ChurnTable, Dataset, InMemoryDataset};
//!
//! let table = ChurnTable::from_path("data/telco.csv")?;
//! let dataset = InMemoryDataset::new(matrix, labels)?;
//! for batch in dataset.batches(32) {
//!     let (x_batch, y_batch) = batch?;
//!     assert_eq!(x_batch.nrows(), y_batch.len());
//! }
//! ```

use crate::preprocessing::EncodingError;
use ndarray::{Array1, Array2};
use std::{fmt::Debug, ops::Range, path::PathBuf};
use thiserror::Error;

pub mod memory;
pub mod split;
pub mod table;

pub use self::memory::InMemoryDataset;
pub use self::split::{stratified_split, SplitIndices};
pub use self::table::{ChurnTable, TableSummary};

/// Failure to load or shape training data.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected column {0:?}")]
    UnknownColumn(String),
    #[error("Column {0:?} appears more than once")]
    DuplicateColumn(String),
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Row {row}: {source}")]
    Encoding {
        row: usize,
        #[source]
        source: EncodingError,
    },
    #[error("Dataset is empty")]
    Empty,
    #[error("Shape mismatch: {0}")]
    Shape(String),
    #[error("Invalid split: {0}")]
    Split(String),
}

/// Row-addressable `(X, y)` source consumed by the gradient trainer.
///
/// `X` is `(rows, features)` and `y` holds one `0.0`/`1.0` label per row.
pub trait Dataset {
    type Error: Debug + 'static;

    /// Row count, when the source knows it up front.
    fn len(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Loads the samples in `range`.
    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error>;

    /// Creates an iterator over fixed-size batches; the last batch may be smaller.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }
}

/// Iterator over consecutive batches of a [`Dataset`].
pub struct DatasetBatchIter<'a, D: Dataset> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<D: Dataset> Iterator for DatasetBatchIter<'_, D> {
    type Item = Result<(Array2<f64>, Array1<f64>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }
        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;
        Some(self.dataset.get_batch(range))
    }
}
