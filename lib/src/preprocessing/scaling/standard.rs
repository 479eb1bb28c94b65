//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation. Constant columns get `s = 1`.
//!
//! Only the gradient-trained logistic model uses this; tree models see the raw
//! encoded features.

use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Standard deviation of each feature (zeros replaced by 1).
    pub std: Vec<f64>,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler, PreprocessingError> {
        let mean = data.mean_axis(Axis(0)).ok_or_else(|| {
            PreprocessingError::EmptyData("Cannot fit StandardScaler on empty data".to_string())
        })?;
        // population std (ddof=0)
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        Ok(FittedStandardScaler { mean, std })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the standard deviation values for each feature.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Scale a single feature row.
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, EncodingError> {
        if row.len() != self.n_features() {
            return Err(EncodingError::WidthMismatch {
                expected: self.n_features(),
                got: row.len(),
            });
        }
        Ok((&row - &self.mean) / &self.std)
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Item = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, EncodingError> {
        if data.ncols() != self.n_features() {
            return Err(EncodingError::WidthMismatch {
                expected: self.n_features(),
                got: data.ncols(),
            });
        }
        Ok((data - &self.mean) / &self.std)
    }

    fn extract_params(&self) -> StandardScalerParams {
        StandardScalerParams {
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
        }
    }

    fn from_params(params: StandardScalerParams) -> Result<Self, PreprocessingError> {
        if params.mean.len() != params.std.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: params.mean.len(),
                got_features: params.std.len(),
            });
        }
        if params.std.iter().any(|&s| s <= 0.0 || !s.is_finite()) {
            return Err(PreprocessingError::SchemaMismatch(
                "StandardScaler std must be positive and finite".to_string(),
            ));
        }
        Ok(Self {
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        // 3 samples, 2 features
        array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]]
    }

    #[test]
    fn test_standard_scaler_fit() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();

        assert!((fitted.mean()[0] - 2.0).abs() < 1e-12);
        assert!((fitted.mean()[1] - 10.0).abs() < 1e-12);
        assert!((fitted.std()[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        // constant column
        assert_eq!(fitted.std()[1], 1.0);
    }

    #[test]
    fn test_standard_scaler_transform() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let scaled = fitted.transform(&data).unwrap();

        let col0 = scaled.column(0);
        assert!(col0.sum().abs() < 1e-12);
        assert!((col0[2] - (1.0 / (2.0f64 / 3.0).sqrt())).abs() < 1e-12);
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_row_and_matrix_agree() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let scaled = fitted.transform(&data).unwrap();

        for (i, row) in data.rows().into_iter().enumerate() {
            assert_eq!(fitted.transform_row(row).unwrap(), scaled.row(i));
        }
    }

    #[test]
    fn test_width_mismatch() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let err = fitted.transform_row(array![1.0, 2.0, 3.0].view()).unwrap_err();
        assert_eq!(err, EncodingError::WidthMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_empty_data() {
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            StandardScaler::new().fit(&empty),
            Err(PreprocessingError::EmptyData(_))
        ));
    }

    #[test]
    fn test_params_round_trip() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let loaded = FittedStandardScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(loaded, fitted);
    }
}
