//! Raw customer record and the fixed field set of the Telco churn table.
//!
//! The record is what both the training table rows and the inference requests
//! deserialize into, so field names here are the wire/CSV names verbatim.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier column, dropped before modeling.
pub const ID_COLUMN: &str = "customerID";

/// Label column, present only in the training table.
pub const LABEL_COLUMN: &str = "Churn";

/// Value of the monetary field as it arrives: a number or a possibly malformed string.
///
/// Deserialization accepts any scalar. Anything that is not a number is kept
/// as text and left to the median coercion, so a bad cell never fails a load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonetaryValue {
    Number(f64),
    Text(String),
}

struct MonetaryVisitor;

impl<'de> Visitor<'de> for MonetaryVisitor {
    type Value = MonetaryValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Number(v as f64))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Number(v as f64))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Number(v as f64))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Text(String::new()))
    }

    fn visit_none<E: de::Error>(self) -> Result<MonetaryValue, E> {
        Ok(MonetaryValue::Text(String::new()))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<MonetaryValue, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Deserialize<'de> for MonetaryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MonetaryVisitor)
    }
}

impl From<f64> for MonetaryValue {
    fn from(value: f64) -> Self {
        MonetaryValue::Number(value)
    }
}

impl From<&str> for MonetaryValue {
    fn from(value: &str) -> Self {
        MonetaryValue::Text(value.to_string())
    }
}

impl fmt::Display for MonetaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonetaryValue::Number(v) => write!(f, "{}", v),
            MonetaryValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Two-valued categorical fields, including the training label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BinaryField {
    Gender,
    Partner,
    Dependents,
    PhoneService,
    PaperlessBilling,
    Churn,
}

impl BinaryField {
    /// Binary fields that are model inputs (the label is excluded).
    pub const FEATURES: [BinaryField; 5] = [
        BinaryField::Gender,
        BinaryField::Partner,
        BinaryField::Dependents,
        BinaryField::PhoneService,
        BinaryField::PaperlessBilling,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BinaryField::Gender => "gender",
            BinaryField::Partner => "Partner",
            BinaryField::Dependents => "Dependents",
            BinaryField::PhoneService => "PhoneService",
            BinaryField::PaperlessBilling => "PaperlessBilling",
            BinaryField::Churn => LABEL_COLUMN,
        }
    }
}

impl fmt::Display for BinaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Multi-valued categorical fields, each backed by its own label encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTV,
    StreamingMovies,
    Contract,
    PaymentMethod,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 10] = [
        CategoricalField::MultipleLines,
        CategoricalField::InternetService,
        CategoricalField::OnlineSecurity,
        CategoricalField::OnlineBackup,
        CategoricalField::DeviceProtection,
        CategoricalField::TechSupport,
        CategoricalField::StreamingTV,
        CategoricalField::StreamingMovies,
        CategoricalField::Contract,
        CategoricalField::PaymentMethod,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::MultipleLines => "MultipleLines",
            CategoricalField::InternetService => "InternetService",
            CategoricalField::OnlineSecurity => "OnlineSecurity",
            CategoricalField::OnlineBackup => "OnlineBackup",
            CategoricalField::DeviceProtection => "DeviceProtection",
            CategoricalField::TechSupport => "TechSupport",
            CategoricalField::StreamingTV => "StreamingTV",
            CategoricalField::StreamingMovies => "StreamingMovies",
            CategoricalField::Contract => "Contract",
            CategoricalField::PaymentMethod => "PaymentMethod",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a model-input field is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Binary(BinaryField),
    Categorical(CategoricalField),
    /// Already numeric; copied through unchanged.
    Passthrough,
    /// Numeric-or-string; coerced with the frozen median.
    Monetary,
}

/// Every model-input field of a customer record.
///
/// The identifier and the label are deliberately absent: a [`Field`] is by
/// construction something that ends up in the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    Tenure,
    PhoneService,
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTV,
    StreamingMovies,
    Contract,
    PaperlessBilling,
    PaymentMethod,
    MonthlyCharges,
    TotalCharges,
}

impl Field {
    /// All feature fields in the column order of the public Telco dataset.
    pub const ALL: [Field; 19] = [
        Field::Gender,
        Field::SeniorCitizen,
        Field::Partner,
        Field::Dependents,
        Field::Tenure,
        Field::PhoneService,
        Field::MultipleLines,
        Field::InternetService,
        Field::OnlineSecurity,
        Field::OnlineBackup,
        Field::DeviceProtection,
        Field::TechSupport,
        Field::StreamingTV,
        Field::StreamingMovies,
        Field::Contract,
        Field::PaperlessBilling,
        Field::PaymentMethod,
        Field::MonthlyCharges,
        Field::TotalCharges,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Gender => FieldKind::Binary(BinaryField::Gender),
            Field::Partner => FieldKind::Binary(BinaryField::Partner),
            Field::Dependents => FieldKind::Binary(BinaryField::Dependents),
            Field::PhoneService => FieldKind::Binary(BinaryField::PhoneService),
            Field::PaperlessBilling => FieldKind::Binary(BinaryField::PaperlessBilling),
            Field::MultipleLines => FieldKind::Categorical(CategoricalField::MultipleLines),
            Field::InternetService => FieldKind::Categorical(CategoricalField::InternetService),
            Field::OnlineSecurity => FieldKind::Categorical(CategoricalField::OnlineSecurity),
            Field::OnlineBackup => FieldKind::Categorical(CategoricalField::OnlineBackup),
            Field::DeviceProtection => FieldKind::Categorical(CategoricalField::DeviceProtection),
            Field::TechSupport => FieldKind::Categorical(CategoricalField::TechSupport),
            Field::StreamingTV => FieldKind::Categorical(CategoricalField::StreamingTV),
            Field::StreamingMovies => FieldKind::Categorical(CategoricalField::StreamingMovies),
            Field::Contract => FieldKind::Categorical(CategoricalField::Contract),
            Field::PaymentMethod => FieldKind::Categorical(CategoricalField::PaymentMethod),
            Field::SeniorCitizen | Field::Tenure | Field::MonthlyCharges => FieldKind::Passthrough,
            Field::TotalCharges => FieldKind::Monetary,
        }
    }

    pub fn name(self) -> &'static str {
        match self.kind() {
            FieldKind::Binary(b) => b.name(),
            FieldKind::Categorical(c) => c.name(),
            FieldKind::Passthrough | FieldKind::Monetary => match self {
                Field::SeniorCitizen => "SeniorCitizen",
                Field::Tenure => "tenure",
                Field::MonthlyCharges => "MonthlyCharges",
                _ => "TotalCharges",
            },
        }
    }

    /// Look up a feature field by its column name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of one field of a record, tagged with how it is encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Binary(BinaryField, &'a str),
    Categorical(CategoricalField, &'a str),
    Number(f64),
    Monetary(&'a MonetaryValue),
}

/// One customer as received at the serving boundary or read from a training row.
///
/// Unknown keys (e.g. `customerID` in a request) are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub gender: String,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: i64,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    pub tenure: f64,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: MonetaryValue,
}

impl CustomerRecord {
    /// Raw value of a model-input field.
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field.kind() {
            FieldKind::Binary(b) => FieldValue::Binary(b, self.binary(b).unwrap_or_default()),
            FieldKind::Categorical(c) => FieldValue::Categorical(c, self.categorical(c)),
            FieldKind::Monetary => FieldValue::Monetary(&self.total_charges),
            FieldKind::Passthrough => FieldValue::Number(match field {
                Field::SeniorCitizen => self.senior_citizen as f64,
                Field::Tenure => self.tenure,
                _ => self.monthly_charges,
            }),
        }
    }

    /// Raw string of a binary field; `None` for the label, which a record never carries.
    pub fn binary(&self, field: BinaryField) -> Option<&str> {
        match field {
            BinaryField::Gender => Some(&self.gender),
            BinaryField::Partner => Some(&self.partner),
            BinaryField::Dependents => Some(&self.dependents),
            BinaryField::PhoneService => Some(&self.phone_service),
            BinaryField::PaperlessBilling => Some(&self.paperless_billing),
            BinaryField::Churn => None,
        }
    }

    pub fn categorical(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::MultipleLines => &self.multiple_lines,
            CategoricalField::InternetService => &self.internet_service,
            CategoricalField::OnlineSecurity => &self.online_security,
            CategoricalField::OnlineBackup => &self.online_backup,
            CategoricalField::DeviceProtection => &self.device_protection,
            CategoricalField::TechSupport => &self.tech_support,
            CategoricalField::StreamingTV => &self.streaming_tv,
            CategoricalField::StreamingMovies => &self.streaming_movies,
            CategoricalField::Contract => &self.contract,
            CategoricalField::PaymentMethod => &self.payment_method,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// The single-customer request used throughout the service tests.
    pub fn sample_record() -> CustomerRecord {
        CustomerRecord {
            gender: "Female".into(),
            senior_citizen: 0,
            partner: "Yes".into(),
            dependents: "No".into(),
            tenure: 1.0,
            phone_service: "No".into(),
            multiple_lines: "No phone service".into(),
            internet_service: "DSL".into(),
            online_security: "No".into(),
            online_backup: "Yes".into(),
            device_protection: "No".into(),
            tech_support: "No".into(),
            streaming_tv: "No".into(),
            streaming_movies: "No".into(),
            contract: "Month-to-month".into(),
            paperless_billing: "Yes".into(),
            payment_method: "Electronic check".into(),
            monthly_charges: 29.85,
            total_charges: MonetaryValue::Number(29.85),
        }
    }

    /// Deterministic customer `i`; every category of the public dataset shows up
    /// within the first 24 indices. Every 11th row has a blank `TotalCharges`.
    pub fn customer(i: usize) -> CustomerRecord {
        let internet = ["DSL", "Fiber optic", "No"][i % 3];
        let service = |stride: usize| {
            if internet == "No" {
                "No internet service".to_string()
            } else {
                ["No", "Yes"][(i / stride) % 2].to_string()
            }
        };
        let phone = i % 5 != 0;
        let tenure = (i * 7 % 72) as f64;
        let monthly = 18.25 + (i * 37 % 100) as f64;
        let total = if i % 11 == 10 {
            MonetaryValue::Text(" ".into())
        } else {
            MonetaryValue::Text(format!("{:.2}", tenure * monthly))
        };

        CustomerRecord {
            gender: ["Female", "Male"][i % 2].into(),
            senior_citizen: (i % 7 == 0) as i64,
            partner: ["Yes", "No"][(i / 2) % 2].into(),
            dependents: ["No", "Yes"][(i / 3) % 2].into(),
            tenure,
            phone_service: if phone { "Yes" } else { "No" }.into(),
            multiple_lines: if phone {
                ["No", "Yes"][(i / 4) % 2]
            } else {
                "No phone service"
            }
            .into(),
            internet_service: internet.into(),
            online_security: service(1),
            online_backup: service(2),
            device_protection: service(3),
            tech_support: service(4),
            streaming_tv: service(5),
            streaming_movies: service(6),
            contract: ["Month-to-month", "One year", "Two year"][(i / 2) % 3].into(),
            paperless_billing: ["Yes", "No"][(i / 5) % 2].into(),
            payment_method: [
                "Electronic check",
                "Mailed check",
                "Bank transfer (automatic)",
                "Credit card (automatic)",
            ][i % 4]
                .into(),
            monthly_charges: monthly,
            total_charges: total,
        }
    }

    pub fn sample_table(n: usize) -> Vec<CustomerRecord> {
        (0..n).map(customer).collect()
    }
}
