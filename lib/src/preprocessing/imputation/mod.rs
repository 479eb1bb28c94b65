//! Imputation of malformed numeric values.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`MonetaryCoercion`] | Parse `TotalCharges`, fill unparseable values with the training median |

pub mod median;

pub use median::{
    parse_monetary, FittedMonetaryCoercion, MonetaryCoercion, MonetaryCoercionParams,
};
