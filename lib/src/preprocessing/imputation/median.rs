//! Median coercion for the monetary field.
//!
//! The raw value arrives either as a number or as a string that may be blank or
//! garbage. Anything that does not parse to a finite float is replaced by the
//! median of the training column, computed once at fit time and frozen.
//!
//! # Example
//! ```ignore
//! use telco_churn::preprocessing::{FittedTransformer, MonetaryCoercion, Transformer};
//!
//! let fitted = MonetaryCoercion.fit(&records)?;
//! assert_eq!(fitted.coerce(&" ".into()), fitted.median());
//! ```

use crate::preprocessing::error::{EncodingError, PreprocessingError};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::schema::{CustomerRecord, MonetaryValue};
use serde::{Deserialize, Serialize};

/// Parse a monetary value, returning `None` when it is blank, non-numeric or non-finite.
pub fn parse_monetary(value: &MonetaryValue) -> Option<f64> {
    let parsed = match value {
        MonetaryValue::Number(v) => *v,
        MonetaryValue::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    parsed.is_finite().then_some(parsed)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 0 {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    } else {
        Some(values[n / 2])
    }
}

/// Unfitted coercion rule for `TotalCharges`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonetaryCoercion;

impl MonetaryCoercion {
    /// Fit from raw column values rather than records.
    pub fn fit_values<'a, I>(&self, values: I) -> Result<FittedMonetaryCoercion, PreprocessingError>
    where
        I: IntoIterator<Item = &'a MonetaryValue>,
    {
        let mut total = 0usize;
        let parsed: Vec<f64> = values
            .into_iter()
            .inspect(|_| total += 1)
            .filter_map(parse_monetary)
            .collect();

        let median = median(parsed).ok_or_else(|| {
            PreprocessingError::EmptyData(format!(
                "No parseable TotalCharges value among {} rows",
                total
            ))
        })?;
        Ok(FittedMonetaryCoercion { median })
    }
}

impl Transformer for MonetaryCoercion {
    type Input = [CustomerRecord];
    type Fitted = FittedMonetaryCoercion;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        self.fit_values(data.iter().map(|r| &r.total_charges))
    }
}

/// Serializable parameters for a fitted coercion rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonetaryCoercionParams {
    pub median: f64,
}

/// Coercion rule with its frozen fill value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedMonetaryCoercion {
    median: f64,
}

impl FittedMonetaryCoercion {
    /// The fit-time median used as the fill value.
    pub fn median(&self) -> f64 {
        self.median
    }

    /// Convert a raw value to a float. Never fails.
    pub fn coerce(&self, value: &MonetaryValue) -> f64 {
        match parse_monetary(value) {
            Some(v) => v,
            None => {
                tracing::debug!(value = %value, median = self.median, "malformed TotalCharges, using median");
                self.median
            }
        }
    }
}

impl FittedTransformer for FittedMonetaryCoercion {
    type Item = MonetaryValue;
    type Output = f64;
    type Params = MonetaryCoercionParams;

    fn transform(&self, item: &MonetaryValue) -> Result<f64, EncodingError> {
        Ok(self.coerce(item))
    }

    fn extract_params(&self) -> MonetaryCoercionParams {
        MonetaryCoercionParams {
            median: self.median,
        }
    }

    fn from_params(params: MonetaryCoercionParams) -> Result<Self, PreprocessingError> {
        if !params.median.is_finite() {
            return Err(PreprocessingError::SchemaMismatch(format!(
                "TotalCharges median must be finite, got {}",
                params.median
            )));
        }
        Ok(Self {
            median: params.median,
        })
    }
}
