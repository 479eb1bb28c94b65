//! Label encoding for one multi-valued categorical column.
//!
//! Maps the category strings observed during fitting to indices (0, 1, 2, ...)
//! in sorted order. Unseen categories are an error, never a fallback code.

use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::schema::{CategoricalField, CustomerRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Label encoder for a single categorical field.
///
/// # Example
/// ```ignore
/// use telco_churn::preprocessing::{CategoricalEncoder, FittedTransformer, Transformer};
/// use telco_churn::schema::CategoricalField;
///
/// let encoder = CategoricalEncoder::new(CategoricalField::Contract);
/// let fitted = encoder.fit(&records)?;
///
/// // Classes sorted: ["Month-to-month", "One year", "Two year"]
/// assert_eq!(fitted.transform("One year")?, 1);
/// ```
#[derive(Clone, Debug)]
pub struct CategoricalEncoder {
    field: CategoricalField,
}

impl CategoricalEncoder {
    /// Create a new encoder for `field`.
    pub fn new(field: CategoricalField) -> Self {
        Self { field }
    }

    /// Fit from raw column values rather than records.
    pub fn fit_values<'a, I>(
        &self,
        values: I,
    ) -> Result<FittedCategoricalEncoder, PreprocessingError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        if classes.is_empty() {
            return Err(PreprocessingError::EmptyData(format!(
                "Cannot fit encoder for {} on empty data",
                self.field
            )));
        }

        Ok(FittedCategoricalEncoder::from_classes(
            self.field,
            classes.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl Transformer for CategoricalEncoder {
    type Input = [CustomerRecord];
    type Fitted = FittedCategoricalEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        self.fit_values(data.iter().map(|r| r.categorical(self.field)))
    }
}

/// Serializable parameters for a fitted categorical encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoderParams {
    pub field: CategoricalField,
    /// Unique classes in sorted order.
    pub classes: Vec<String>,
}

/// Fitted categorical encoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedCategoricalEncoder {
    field: CategoricalField,
    /// Unique classes in sorted order; the index is the code.
    classes: Vec<String>,
    class_to_idx: HashMap<String, usize>,
}

impl FittedCategoricalEncoder {
    fn from_classes(field: CategoricalField, classes: Vec<String>) -> Self {
        let class_to_idx = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();
        Self {
            field,
            classes,
            class_to_idx,
        }
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    /// Get the unique classes.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Get the number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.class_to_idx.contains_key(value)
    }

    /// Code of a category.
    pub fn encode(&self, value: &str) -> Result<usize, EncodingError> {
        self.class_to_idx
            .get(value)
            .copied()
            .ok_or_else(|| EncodingError::UnknownCategoryValue {
                field: self.field.name(),
                value: value.to_string(),
            })
    }

    /// Category of a code.
    pub fn decode(&self, code: usize) -> Result<&str, EncodingError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(EncodingError::UnknownCode {
                field: self.field.name(),
                code,
                n_classes: self.classes.len(),
            })
    }
}

impl FittedTransformer for FittedCategoricalEncoder {
    type Item = str;
    type Output = usize;
    type Params = CategoricalEncoderParams;

    fn transform(&self, item: &str) -> Result<usize, EncodingError> {
        self.encode(item)
    }

    fn extract_params(&self) -> CategoricalEncoderParams {
        CategoricalEncoderParams {
            field: self.field,
            classes: self.classes.clone(),
        }
    }

    fn from_params(params: CategoricalEncoderParams) -> Result<Self, PreprocessingError> {
        if params.classes.is_empty() {
            return Err(PreprocessingError::EmptyData(format!(
                "Encoder for {} has no classes",
                params.field
            )));
        }
        // Codes are positions in the sorted class list; anything else would
        // silently renumber categories on load.
        if params.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PreprocessingError::SchemaMismatch(format!(
                "Encoder for {} has unsorted or duplicate classes",
                params.field
            )));
        }
        Ok(Self::from_classes(params.field, params.classes))
    }
}
