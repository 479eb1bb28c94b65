//! The set of fitted categorical encoders, one per multi-valued field.
//!
//! The registry is fitted once over the full training table and then handed,
//! frozen, to the serving process. Encoders are stored in
//! [`CategoricalField::ALL`] order so a registry can never be missing a field.

use crate::preprocessing::encoding::label::{
    CategoricalEncoder, CategoricalEncoderParams, FittedCategoricalEncoder,
};
use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::schema::{CategoricalField, CustomerRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical columns of a table with values replaced by codes.
pub type EncodedColumns = BTreeMap<CategoricalField, Vec<usize>>;

/// Serializable parameters for a fitted registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistryParams {
    pub encoders: Vec<CategoricalEncoderParams>,
}

/// One fitted encoder per categorical field.
#[derive(Clone, Debug)]
pub struct EncoderRegistry {
    // Invariant: encoders[i].field() == CategoricalField::ALL[i]
    encoders: Vec<FittedCategoricalEncoder>,
}

impl EncoderRegistry {
    /// Fit every categorical encoder and encode the table with it.
    pub fn fit(table: &[CustomerRecord]) -> Result<(Self, EncodedColumns), PreprocessingError> {
        if table.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit encoder registry on an empty table".to_string(),
            ));
        }

        let mut encoders = Vec::with_capacity(CategoricalField::ALL.len());
        let mut columns = EncodedColumns::new();
        for field in CategoricalField::ALL {
            let fitted = CategoricalEncoder::new(field).fit(table)?;
            let codes = table
                .iter()
                .map(|r| fitted.encode(r.categorical(field)))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(field = %field, classes = fitted.n_classes(), "fitted encoder");
            columns.insert(field, codes);
            encoders.push(fitted);
        }

        Ok((Self { encoders }, columns))
    }

    pub fn get(&self, field: CategoricalField) -> &FittedCategoricalEncoder {
        &self.encoders[field as usize]
    }

    pub fn encoders(&self) -> impl Iterator<Item = &FittedCategoricalEncoder> {
        self.encoders.iter()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    pub fn encode(&self, field: CategoricalField, value: &str) -> Result<usize, EncodingError> {
        self.get(field).transform(value)
    }

    pub fn decode(&self, field: CategoricalField, code: usize) -> Result<&str, EncodingError> {
        self.get(field).decode(code)
    }

    /// Codes of every categorical field of `record`.
    pub fn transform(
        &self,
        record: &CustomerRecord,
    ) -> Result<BTreeMap<CategoricalField, usize>, EncodingError> {
        CategoricalField::ALL
            .into_iter()
            .map(|field| Ok((field, self.encode(field, record.categorical(field))?)))
            .collect()
    }

    /// Check category membership without producing codes.
    pub fn validate(&self, record: &CustomerRecord) -> Result<(), EncodingError> {
        for encoder in &self.encoders {
            let value = record.categorical(encoder.field());
            if !encoder.contains(value) {
                return Err(EncodingError::UnknownCategoryValue {
                    field: encoder.field().name(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn extract_params(&self) -> EncoderRegistryParams {
        EncoderRegistryParams {
            encoders: self.encoders.iter().map(|e| e.extract_params()).collect(),
        }
    }

    pub fn from_params(params: EncoderRegistryParams) -> Result<Self, PreprocessingError> {
        let fields: Vec<CategoricalField> = params.encoders.iter().map(|p| p.field).collect();
        if fields != CategoricalField::ALL {
            return Err(PreprocessingError::SchemaMismatch(format!(
                "Encoder registry covers {:?}, expected {:?}",
                fields,
                CategoricalField::ALL
            )));
        }

        let encoders = params
            .encoders
            .into_iter()
            .map(FittedCategoricalEncoder::from_params)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { encoders })
    }
}
