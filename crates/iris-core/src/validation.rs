//! Ordered parse and range-check pipeline for raw prediction input
//!
//! Parsing covers all four fields before any range is checked, so a missing
//! field is reported as invalid input even if an earlier field is out of range.

use crate::error::ValidationError;
use crate::models::{Feature, FeatureVector, NUM_FEATURES};
use serde_json::Value;

/// Extract and validate the four measurements from a JSON object
pub fn parse_features(raw: &Value) -> Result<FeatureVector, ValidationError> {
    let object = raw.as_object().ok_or(ValidationError::InvalidInput)?;

    let mut values = [0.0; NUM_FEATURES];
    for feature in Feature::ALL {
        let value = object
            .get(feature.key())
            .ok_or(ValidationError::InvalidInput)?;
        values[feature.index()] = coerce_number(value).ok_or(ValidationError::InvalidInput)?;
    }

    validate_ranges(values)
}

/// Check each value against its range in canonical order; first failure wins
pub fn validate_ranges(values: [f64; NUM_FEATURES]) -> Result<FeatureVector, ValidationError> {
    for feature in Feature::ALL {
        let range = feature.range();
        if !range.contains(values[feature.index()]) {
            return Err(ValidationError::OutOfRange { feature, range });
        }
    }
    Ok(FeatureVector::from_validated(values))
}

/// JSON numbers and numeric strings are accepted
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
