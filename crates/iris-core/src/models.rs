//! Core data models for the iris classifier

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of measurements in a feature vector
pub const NUM_FEATURES: usize = 4;

/// Number of species the classifier distinguishes
pub const NUM_SPECIES: usize = 3;

/// Inclusive valid range for a single measurement, in centimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// NaN and infinities are never contained
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for FeatureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}, {:.1}]", self.min, self.max)
    }
}

/// The four measurements, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl Feature {
    /// Canonical order; validation checks fields in this order
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::SepalLength,
        Feature::SepalWidth,
        Feature::PetalLength,
        Feature::PetalWidth,
    ];

    /// Request field name
    pub fn key(&self) -> &'static str {
        match self {
            Feature::SepalLength => "sepal_length",
            Feature::SepalWidth => "sepal_width",
            Feature::PetalLength => "petal_length",
            Feature::PetalWidth => "petal_width",
        }
    }

    /// Human readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Feature::SepalLength => "Sepal length",
            Feature::SepalWidth => "Sepal width",
            Feature::PetalLength => "Petal length",
            Feature::PetalWidth => "Petal width",
        }
    }

    pub fn range(&self) -> FeatureRange {
        match self {
            Feature::SepalLength => FeatureRange::new(4.0, 8.0),
            Feature::SepalWidth => FeatureRange::new(2.0, 5.0),
            Feature::PetalLength => FeatureRange::new(1.0, 7.0),
            Feature::PetalWidth => FeatureRange::new(0.1, 3.0),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Feature::SepalLength => 0,
            Feature::SepalWidth => 1,
            Feature::PetalLength => 2,
            Feature::PetalWidth => 3,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated flower measurements in centimeters
///
/// Construct through [`crate::validation::parse_features`] or
/// [`FeatureVector::new`]; both apply the same range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
}

impl FeatureVector {
    pub fn new(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> Result<Self, crate::error::ValidationError> {
        crate::validation::validate_ranges([sepal_length, sepal_width, petal_length, petal_width])
    }

    /// Only called once the values passed the range checks
    pub(crate) fn from_validated(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            sepal_length: values[0],
            sepal_width: values[1],
            petal_length: values[2],
            petal_width: values[3],
        }
    }

    pub fn sepal_length(&self) -> f64 {
        self.sepal_length
    }

    pub fn sepal_width(&self) -> f64 {
        self.sepal_width
    }

    pub fn petal_length(&self) -> f64 {
        self.petal_length
    }

    pub fn petal_width(&self) -> f64 {
        self.petal_width
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.as_array()[feature.index()]
    }

    pub fn as_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

/// Iris species, ordered as the model's class indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    pub const ALL: [Species; NUM_SPECIES] = [
        Species::Setosa,
        Species::Versicolor,
        Species::Virginica,
    ];

    pub fn index(&self) -> usize {
        match self {
            Species::Setosa => 0,
            Species::Versicolor => 1,
            Species::Virginica => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Species> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Species::Setosa => "Setosa",
            Species::Versicolor => "Versicolor",
            Species::Virginica => "Virginica",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Species::Setosa => {
                "Iris Setosa is characterized by its small petals and distinctive appearance."
            }
            Species::Versicolor => {
                "Iris Versicolor has medium-sized petals with beautiful purple-blue colors."
            }
            Species::Virginica => {
                "Iris Virginica features large petals and is often found in wetland areas."
            }
        }
    }

    /// Accepts `setosa`, `Iris-setosa`, `Setosa` or the class index
    pub fn parse_label(label: &str) -> Option<Species> {
        let trimmed = label.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Self::from_index(index);
        }
        let lower = trimmed.to_ascii_lowercase();
        let name = lower.strip_prefix("iris-").unwrap_or(&lower);
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a classifier for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub species: Species,
    /// Per-species probability as a fraction, indexed by [`Species::index`]
    pub probabilities: [f64; NUM_SPECIES],
}

impl ClassificationResult {
    /// Picks the first maximal probability as the predicted species
    pub fn from_probabilities(probabilities: [f64; NUM_SPECIES]) -> Self {
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate().skip(1) {
            if *p > probabilities[best] {
                best = i;
            }
        }
        Self {
            species: Species::ALL[best],
            probabilities,
        }
    }

    pub fn probability(&self, species: Species) -> f64 {
        self.probabilities[species.index()]
    }

    pub fn confidence(&self) -> f64 {
        self.probability(self.species)
    }
}

/// Prediction payload returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Species,
    /// Percentage, rounded to two decimals
    pub confidence: f64,
    pub description: String,
    /// Percentage for every species
    pub probabilities: BTreeMap<Species, f64>,
}

/// Error payload returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_order_matches_indices() {
        for (i, species) in Species::ALL.iter().enumerate() {
            assert_eq!(species.index(), i);
            assert_eq!(Species::from_index(i), Some(*species));
        }
        assert_eq!(Species::from_index(3), None);
    }

    #[test]
    fn test_species_parse_label_variants() {
        assert_eq!(Species::parse_label("setosa"), Some(Species::Setosa));
        assert_eq!(Species::parse_label("Iris-versicolor"), Some(Species::Versicolor));
        assert_eq!(Species::parse_label(" Virginica "), Some(Species::Virginica));
        assert_eq!(Species::parse_label("2"), Some(Species::Virginica));
        assert_eq!(Species::parse_label("rose"), None);
    }

    #[test]
    fn test_argmax_picks_a_maximal_species() {
        let tie = [0.4, 0.4, 0.2];
        let first = ClassificationResult::from_probabilities(tie);
        let second = ClassificationResult::from_probabilities(tie);
        assert_eq!(first.species, second.species);
        assert!((first.confidence() - 0.4).abs() < 1e-12);
        assert_ne!(first.species, Species::Virginica);

        let result = ClassificationResult::from_probabilities([0.1, 0.3, 0.6]);
        assert_eq!(result.species, Species::Virginica);
        assert!((result.confidence() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_serialize_with_species_names() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert(Species::Setosa, 97.0);
        probabilities.insert(Species::Versicolor, 3.0);
        probabilities.insert(Species::Virginica, 0.0);
        let response = PredictionResponse {
            prediction: Species::Setosa,
            confidence: 97.0,
            description: Species::Setosa.description().to_string(),
            probabilities,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["prediction"], "Setosa");
        assert_eq!(json["probabilities"]["Versicolor"], 3.0);
    }

    #[test]
    fn test_feature_range_display() {
        assert_eq!(Feature::SepalLength.range().to_string(), "[4.0, 8.0]");
        assert!(!Feature::PetalWidth.range().contains(f64::NAN));
    }
}
