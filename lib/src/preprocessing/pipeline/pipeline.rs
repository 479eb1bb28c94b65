//! Feature assembly: raw customer record → fixed-order numeric vector.
//!
//! [`FittedFeaturePipeline`] bundles everything learned from the training
//! table (the categorical encoder registry, the frozen `TotalCharges` median and
//! the column order) and is the only thing that turns records into numbers.
//! Bulk assembly over a table goes through the same single-record path, so a
//! training row and an inference request with the same fields always produce
//! the same vector.
//!
//! # Example
//! ```ignore
//! use telco_churn::preprocessing::{FeaturePipeline, Transformer};
//!
//! let pipeline = FeaturePipeline::new(columns)?;
//! let (fitted, matrix) = pipeline.fit_transform(&records)?;
//! fitted.save(&paths.encoders)?;
//!
//! // At serving time
//! let fitted = FittedFeaturePipeline::load(&paths.encoders)?;
//! let features = fitted.assemble(&request)?;
//! ```

use crate::preprocessing::encoding::{binary, EncoderRegistry, EncoderRegistryParams};
use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::preprocessing::imputation::{
    FittedMonetaryCoercion, MonetaryCoercion, MonetaryCoercionParams,
};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::schema::{CustomerRecord, Field, FieldValue};
use crate::serialization::{load_artifact, save_artifact, ArtifactError, ArtifactKind};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Encoded feature vector of one customer.
pub type FeatureVector = Array1<f64>;

/// Unfitted feature pipeline: just the column order.
#[derive(Clone, Debug, PartialEq)]
pub struct FeaturePipeline {
    columns: Vec<Field>,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self {
            columns: Field::ALL.to_vec(),
        }
    }
}

fn check_columns(columns: &[Field]) -> Result<(), PreprocessingError> {
    let mut seen = HashSet::with_capacity(columns.len());
    if let Some(dup) = columns.iter().find(|f| !seen.insert(**f)) {
        return Err(PreprocessingError::SchemaMismatch(format!(
            "Column {} appears more than once",
            dup
        )));
    }
    let missing: Vec<&str> = Field::ALL
        .iter()
        .filter(|f| !seen.contains(*f))
        .map(|f| f.name())
        .collect();
    if !missing.is_empty() {
        return Err(PreprocessingError::SchemaMismatch(format!(
            "Missing feature columns: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

impl FeaturePipeline {
    /// Pipeline with an explicit column order, typically the training CSV header
    /// with the identifier and label removed. Every feature field must appear
    /// exactly once.
    pub fn new(columns: Vec<Field>) -> Result<Self, PreprocessingError> {
        check_columns(&columns)?;
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    /// Fit, then assemble the whole table through the fitted pipeline.
    pub fn fit_transform(
        &self,
        table: &[CustomerRecord],
    ) -> Result<(FittedFeaturePipeline, Array2<f64>), PreprocessingError> {
        let fitted = self.fit(table)?;
        let matrix = fitted.assemble_table(table)?;
        Ok((fitted, matrix))
    }
}

impl Transformer for FeaturePipeline {
    type Input = [CustomerRecord];
    type Fitted = FittedFeaturePipeline;

    fn fit(&self, table: &[CustomerRecord]) -> Result<FittedFeaturePipeline, PreprocessingError> {
        let (registry, _) = EncoderRegistry::fit(table)?;
        let coercion = MonetaryCoercion.fit(table)?;
        tracing::info!(
            rows = table.len(),
            features = self.columns.len(),
            total_charges_median = coercion.median(),
            "fitted feature pipeline"
        );
        Ok(FittedFeaturePipeline {
            columns: self.columns.clone(),
            registry,
            coercion,
        })
    }
}

/// Serializable parameters for a fitted feature pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipelineParams {
    pub columns: Vec<Field>,
    pub registry: EncoderRegistryParams,
    pub coercion: MonetaryCoercionParams,
}

/// Fitted, frozen feature pipeline shared by training and serving.
#[derive(Clone, Debug)]
pub struct FittedFeaturePipeline {
    columns: Vec<Field>,
    registry: EncoderRegistry,
    coercion: FittedMonetaryCoercion,
}

impl FittedFeaturePipeline {
    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn coercion(&self) -> &FittedMonetaryCoercion {
        &self.coercion
    }

    fn encode_field(&self, record: &CustomerRecord, field: Field) -> Result<f64, EncodingError> {
        match record.value(field) {
            FieldValue::Binary(b, raw) => binary::map(b, raw).map(f64::from),
            FieldValue::Categorical(c, raw) => self.registry.encode(c, raw).map(|code| code as f64),
            FieldValue::Number(v) => Ok(v),
            FieldValue::Monetary(m) => Ok(self.coercion.coerce(m)),
        }
    }

    /// Check binary values and category membership without encoding.
    ///
    /// Binary fields are checked in column order, then the registry checks
    /// every categorical field. The first failure is reported.
    pub fn validate(&self, record: &CustomerRecord) -> Result<(), EncodingError> {
        for &field in &self.columns {
            if let FieldValue::Binary(b, raw) = record.value(field) {
                binary::map(b, raw)?;
            }
        }
        self.registry.validate(record)
    }

    /// Encode one record into a feature vector in column order.
    pub fn assemble(&self, record: &CustomerRecord) -> Result<FeatureVector, EncodingError> {
        self.columns
            .iter()
            .map(|&field| self.encode_field(record, field))
            .collect::<Result<Vec<f64>, _>>()
            .map(Array1::from)
    }

    /// Encode a table row by row through [`assemble`](Self::assemble).
    pub fn assemble_table(&self, table: &[CustomerRecord]) -> Result<Array2<f64>, EncodingError> {
        let mut matrix = Array2::zeros((table.len(), self.n_features()));
        for (mut row, record) in matrix.rows_mut().into_iter().zip(table) {
            row.assign(&self.assemble(record)?);
        }
        Ok(matrix)
    }

    /// Write the pipeline as the encoder artifact.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        save_artifact(path, ArtifactKind::FeaturePipeline, &self.extract_params())
    }

    /// Read a pipeline written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let params: FeaturePipelineParams = load_artifact(path, ArtifactKind::FeaturePipeline)?;
        Self::from_params(params).map_err(|e| ArtifactError::Incompatible(e.to_string()))
    }
}

impl FittedTransformer for FittedFeaturePipeline {
    type Item = CustomerRecord;
    type Output = FeatureVector;
    type Params = FeaturePipelineParams;

    fn transform(&self, record: &CustomerRecord) -> Result<FeatureVector, EncodingError> {
        self.assemble(record)
    }

    fn extract_params(&self) -> FeaturePipelineParams {
        FeaturePipelineParams {
            columns: self.columns.clone(),
            registry: self.registry.extract_params(),
            coercion: self.coercion.extract_params(),
        }
    }

    fn from_params(params: FeaturePipelineParams) -> Result<Self, PreprocessingError> {
        check_columns(&params.columns)?;
        Ok(Self {
            columns: params.columns,
            registry: EncoderRegistry::from_params(params.registry)?,
            coercion: FittedMonetaryCoercion::from_params(params.coercion)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::{sample_record, sample_table};
    use crate::schema::{CategoricalField, MonetaryValue};

    fn fitted() -> FittedFeaturePipeline {
        FeaturePipeline::default().fit(&sample_table(40)).unwrap()
    }

    fn position(pipeline: &FittedFeaturePipeline, field: Field) -> usize {
        pipeline.columns().iter().position(|&f| f == field).unwrap()
    }

    #[test]
    fn test_assemble_sample_record() {
        let pipeline = fitted();
        let features = pipeline.assemble(&sample_record()).unwrap();

        assert_eq!(features.len(), 19);
        assert_eq!(features[position(&pipeline, Field::Gender)], 0.0);
        assert_eq!(features[position(&pipeline, Field::Partner)], 1.0);
        assert_eq!(features[position(&pipeline, Field::PhoneService)], 0.0);
        assert_eq!(features[position(&pipeline, Field::Tenure)], 1.0);
        assert_eq!(features[position(&pipeline, Field::MonthlyCharges)], 29.85);
        assert_eq!(features[position(&pipeline, Field::TotalCharges)], 29.85);
        // "DSL" sorts first
        assert_eq!(features[position(&pipeline, Field::InternetService)], 0.0);
        assert_eq!(features[position(&pipeline, Field::Contract)], 0.0);
    }

    #[test]
    fn test_table_rows_equal_single_record_assembly() {
        let table = sample_table(40);
        let (pipeline, matrix) = FeaturePipeline::default().fit_transform(&table).unwrap();

        assert_eq!(matrix.dim(), (40, 19));
        for (i, record) in table.iter().enumerate() {
            assert_eq!(pipeline.assemble(record).unwrap(), matrix.row(i));
        }
    }

    #[test]
    fn test_column_order_is_respected() {
        let mut columns = Field::ALL.to_vec();
        columns.reverse();
        let pipeline = FeaturePipeline::new(columns)
            .unwrap()
            .fit(&sample_table(40))
            .unwrap();
        let reference = fitted();

        let reversed = pipeline.assemble(&sample_record()).unwrap();
        let forward = reference.assemble(&sample_record()).unwrap();
        let mut expected = forward.to_vec();
        expected.reverse();
        assert_eq!(reversed.to_vec(), expected);
    }

    #[test]
    fn test_blank_total_charges_uses_frozen_median() {
        let pipeline = fitted();
        let mut record = sample_record();
        record.total_charges = MonetaryValue::Text(String::new());

        let features = pipeline.assemble(&record).unwrap();
        assert_eq!(
            features[position(&pipeline, Field::TotalCharges)],
            pipeline.coercion().median()
        );
    }

    #[test]
    fn test_validate_reports_first_offending_field() {
        let pipeline = fitted();
        assert!(pipeline.validate(&sample_record()).is_ok());

        let mut record = sample_record();
        record.gender = "Other".into();
        record.contract = "Weekly".into();

        let expected = EncodingError::UnrecognizedBinaryValue {
            field: "gender",
            value: "Other".into(),
        };
        assert_eq!(pipeline.validate(&record).unwrap_err(), expected);
        assert_eq!(pipeline.assemble(&record).unwrap_err(), expected);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let pipeline = fitted();
        let mut record = sample_record();
        record.internet_service = "Satellite".into();

        assert!(matches!(
            pipeline.validate(&record),
            Err(EncodingError::UnknownCategoryValue { field: "InternetService", .. })
        ));
        assert_eq!(pipeline.validate(&record), pipeline.registry().validate(&record));
        assert!(pipeline.assemble(&record).is_err());
    }

    #[test]
    fn test_new_rejects_bad_columns() {
        let mut duplicated = Field::ALL.to_vec();
        duplicated[0] = Field::Tenure;
        assert!(matches!(
            FeaturePipeline::new(duplicated),
            Err(PreprocessingError::SchemaMismatch(_))
        ));

        let short = Field::ALL[..18].to_vec();
        assert!(matches!(
            FeaturePipeline::new(short),
            Err(PreprocessingError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoders.bin");
        let pipeline = fitted();
        pipeline.save(&path).unwrap();

        let loaded = FittedFeaturePipeline::load(&path).unwrap();
        assert_eq!(loaded.columns(), pipeline.columns());
        assert_eq!(loaded.coercion().median(), pipeline.coercion().median());
        assert_eq!(
            loaded.registry().get(CategoricalField::PaymentMethod).classes(),
            pipeline.registry().get(CategoricalField::PaymentMethod).classes()
        );
        for record in sample_table(40) {
            assert_eq!(
                loaded.assemble(&record).unwrap(),
                pipeline.assemble(&record).unwrap()
            );
        }
    }
}
