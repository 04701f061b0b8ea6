//! The six applicant attributes and their canonical order.
//!
//! The scaler and the classifier are trained on columns in exactly the order
//! of [`FEATURE_NAMES`]; every conversion into a feature row goes through this
//! module so the order cannot drift.

use crate::error::ScoringError;
use ndarray::Array1;
use std::borrow::Borrow;

pub const N_FEATURES: usize = 6;

/// Feature names in column order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "annual_income",
    "credit_history_length",
    "num_credit_cards",
    "total_debt",
    "payment_consistency",
    "age",
];

const FEATURE_DESCRIPTIONS: [&str; N_FEATURES] = [
    "Annual income in USD",
    "Length of credit history in years",
    "Number of open credit cards",
    "Total outstanding debt in USD",
    "Share of payments made on time, from 0 to 1",
    "Age of the applicant in years",
];

/// Names the inference input must provide, in column order.
pub fn required_features() -> &'static [&'static str] {
    &FEATURE_NAMES
}

/// Human-readable description of each feature, in column order.
pub fn feature_descriptions() -> impl Iterator<Item = (&'static str, &'static str)> {
    FEATURE_NAMES.into_iter().zip(FEATURE_DESCRIPTIONS)
}

/// Column of `name`, if it is one of the required features.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&n| n == name)
}

/// One applicant's financial attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct FeatureVector {
    pub annual_income: f64,
    pub credit_history_length: u32,
    pub num_credit_cards: u32,
    pub total_debt: f64,
    pub payment_consistency: f64,
    pub age: u32,
}

impl FeatureVector {
    /// The feature row in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(vec![
            self.annual_income,
            f64::from(self.credit_history_length),
            f64::from(self.num_credit_cards),
            self.total_debt,
            self.payment_consistency,
            f64::from(self.age),
        ])
    }
}

/// Builds a feature row from `(name, value)` pairs given in any order.
///
/// Unknown names are ignored and a repeated name keeps its last value.
/// Values are taken as-is; integer-valued features are not rounded.
///
/// # Errors
///
/// `ScoringError::MissingFeature` names the first absent feature in column
/// order; `ScoringError::InvalidFeatureValue` rejects NaN and infinities.
pub fn features_from_pairs<I, K, V>(raw: I) -> Result<Array1<f64>, ScoringError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let mut values = [None; N_FEATURES];
    for (name, value) in raw {
        if let Some(column) = feature_index(name.as_ref()) {
            values[column] = Some(*value.borrow());
        }
    }

    FEATURE_NAMES
        .iter()
        .zip(values)
        .map(|(&name, value)| match value {
            None => Err(ScoringError::MissingFeature(name.to_string())),
            Some(v) if !v.is_finite() => Err(ScoringError::InvalidFeatureValue {
                name: name.to_string(),
                value: v,
            }),
            Some(v) => Ok(v),
        })
        .collect()
}
