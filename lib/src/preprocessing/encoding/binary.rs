//! Fixed string → {0, 1} mapping for two-valued fields.
//!
//! Nothing is learned here: the accepted strings are part of the schema, so the
//! same table is used at training and at serving time without persistence.

use crate::preprocessing::error::EncodingError;
use crate::schema::BinaryField;

/// The two accepted strings of a binary field, as `(positive, negative)`.
pub fn labels(field: BinaryField) -> (&'static str, &'static str) {
    match field {
        BinaryField::Gender => ("Male", "Female"),
        BinaryField::Partner
        | BinaryField::Dependents
        | BinaryField::PhoneService
        | BinaryField::PaperlessBilling
        | BinaryField::Churn => ("Yes", "No"),
    }
}

/// Map a raw string to its code.
///
/// Matching is exact; anything but the two accepted strings is rejected.
pub fn map(field: BinaryField, value: &str) -> Result<u8, EncodingError> {
    let (positive, negative) = labels(field);
    if value == positive {
        Ok(1)
    } else if value == negative {
        Ok(0)
    } else {
        Err(EncodingError::UnrecognizedBinaryValue {
            field: field.name(),
            value: value.to_string(),
        })
    }
}

/// Canonical string for a code. Any non-zero code maps to the positive string.
pub fn inverse(field: BinaryField, code: u8) -> &'static str {
    let (positive, negative) = labels(field);
    if code == 0 {
        negative
    } else {
        positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FIELDS: [BinaryField; 6] = [
        BinaryField::Gender,
        BinaryField::Partner,
        BinaryField::Dependents,
        BinaryField::PhoneService,
        BinaryField::PaperlessBilling,
        BinaryField::Churn,
    ];

    #[test]
    fn test_gender_mapping() {
        assert_eq!(map(BinaryField::Gender, "Male").unwrap(), 1);
        assert_eq!(map(BinaryField::Gender, "Female").unwrap(), 0);
    }

    #[test]
    fn test_yes_no_mapping() {
        for field in &ALL_FIELDS[1..] {
            assert_eq!(map(*field, "Yes").unwrap(), 1);
            assert_eq!(map(*field, "No").unwrap(), 0);
        }
    }

    #[test]
    fn test_map_inverse_round_trip() {
        for field in ALL_FIELDS {
            for code in [0u8, 1] {
                assert_eq!(map(field, inverse(field, code)).unwrap(), code);
            }
        }
    }

    #[test]
    fn test_rejects_other_strings() {
        let bad = ["Other", "", "yes", "NO", " Yes", "Yes ", "1", "Male\n"];
        for value in bad {
            let err = map(BinaryField::Partner, value).unwrap_err();
            assert!(matches!(err, EncodingError::UnrecognizedBinaryValue { field: "Partner", .. }));
        }
        assert!(map(BinaryField::Gender, "Other").is_err());
        assert!(map(BinaryField::Gender, "Yes").is_err());
    }

    #[test]
    fn test_error_carries_value() {
        let err = map(BinaryField::Gender, "Other").unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnrecognizedBinaryValue {
                field: "gender",
                value: "Other".to_string()
            }
        );
    }
}
