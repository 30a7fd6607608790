//! Classification output checks and response formatting
//!
//! Converts a [`ClassificationResult`] (fractions) into the
//! [`PredictionResponse`] wire shape (percentages).

use crate::error::ClassifierError;
use crate::models::{ClassificationResult, PredictionResponse, Species, NUM_SPECIES};
use std::collections::BTreeMap;

/// Allowed deviation of the probability sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Decimal places kept for the confidence percentage
pub const CONFIDENCE_DECIMALS: u32 = 2;

/// Reject outputs that are not a probability distribution
pub fn check_probabilities(probabilities: &[f64; NUM_SPECIES]) -> Result<(), ClassifierError> {
    if let Some(bad) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(ClassifierError::MalformedOutput(format!(
            "invalid probability {bad}"
        )));
    }
    let sum: f64 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ClassifierError::MalformedOutput(format!(
            "probabilities sum to {sum}"
        )));
    }
    Ok(())
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Formats classifier output into the response payload
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, result: &ClassificationResult) -> PredictionResponse {
        let probabilities: BTreeMap<Species, f64> = Species::ALL
            .iter()
            .map(|&s| (s, result.probability(s) * 100.0))
            .collect();

        PredictionResponse {
            prediction: result.species,
            confidence: round_to(result.confidence() * 100.0, CONFIDENCE_DECIMALS),
            description: result.species.description().to_string(),
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_to_two_decimals() {
        assert_eq!(round_to(97.123456, 2), 97.12);
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(100.0, 2), 100.0);
    }

    #[test]
    fn test_check_rejects_negative_nan_and_unnormalized() {
        assert!(check_probabilities(&[0.2, 0.3, 0.5]).is_ok());
        assert!(check_probabilities(&[-0.1, 0.6, 0.5]).is_err());
        assert!(check_probabilities(&[f64::NAN, 0.5, 0.5]).is_err());
        assert!(check_probabilities(&[0.2, 0.2, 0.2]).is_err());
    }

    #[test]
    fn test_format_produces_percentages_for_every_species() {
        let result = ClassificationResult::from_probabilities([0.02, 0.9, 0.08]);
        let response = OutputFormatter::new().format(&result);

        assert_eq!(response.prediction, Species::Versicolor);
        assert_eq!(response.confidence, 90.0);
        assert_eq!(response.description, Species::Versicolor.description());
        assert_eq!(response.probabilities.len(), NUM_SPECIES);
        let total: f64 = response.probabilities.values().sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_probabilities_are_not_rounded() {
        let result = ClassificationResult::from_probabilities([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
        let response = OutputFormatter::new().format(&result);
        assert_eq!(response.confidence, 33.33);
        assert!((response.probabilities[&Species::Setosa] - 100.0 / 3.0).abs() < 1e-9);
    }
}
