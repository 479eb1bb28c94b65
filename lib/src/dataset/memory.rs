use crate::dataset::{Dataset, DatasetError};
use ndarray::{s, Array1, Array2};
use std::ops::Range;

/// Encoded features and labels held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl InMemoryDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self, DatasetError> {
        if x.nrows() != y.len() {
            return Err(DatasetError::Shape(format!(
                "x has {} rows but y has {} values",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(DatasetError::Empty);
        }
        Ok(Self { x, y })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

impl Dataset for InMemoryDataset {
    type Error = std::convert::Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.x.nrows())
    }

    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
        let batch_x = self.x.slice(s![range.clone(), ..]).to_owned();
        let batch_y = self.y.slice(s![range]).to_owned();
        Ok((batch_x, batch_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_batches_cover_dataset() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 1.0];
        let dataset = InMemoryDataset::new(x, y).unwrap();

        let batches: Vec<_> = dataset.batches(2).map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].0, array![[1.0], [2.0]]);
        assert_eq!(batches[2].0, array![[5.0]]);
        assert_eq!(batches[2].1, array![1.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let result = InMemoryDataset::new(array![[1.0], [2.0]], array![0.0]);
        assert!(matches!(result, Err(DatasetError::Shape(_))));
    }

    #[test]
    fn test_empty() {
        let result = InMemoryDataset::new(Array2::zeros((0, 3)), Array1::zeros(0));
        assert!(matches!(result, Err(DatasetError::Empty)));
    }
}
