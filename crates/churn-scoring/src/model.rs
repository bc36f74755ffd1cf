//! Classifier and explainer contracts, and a reference linear model.
//!
//! The feature pipeline hands [`FeatureVector`]s to two collaborators:
//!
//! - a [`Classifier`], exposing a 0/1 prediction and a churn probability
//! - an [`Explainer`], exposing a signed per-feature attribution map
//!
//! [`LinearModel`] implements both from fixed, externally supplied
//! coefficients. It does no training; a model file is a JSON document:
//!
//! ```json
//! {
//!   "name": "churn-logit-v3",
//!   "intercept": -1.2,
//!   "coefficients": { "tenure": -0.05, "contract": -0.8, "monthlycharges": 0.02 },
//!   "baseline": { "tenure": 32.0, "monthlycharges": 64.0 },
//!   "threshold": 0.5
//! }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use churn_scoring::{Classifier, LinearModel};
//!
//! let model = LinearModel::load("models/churn.json")?;
//! for row in batch.rows() {
//!     println!("{} ({:.4})", model.predict(row), model.predict_probability(row));
//! }
//! ```

use crate::error::ScoringError;
use churn_features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Binary churn classifier over model-schema feature vectors.
pub trait Classifier: Send + Sync {
    /// Probability of the positive (churn) class, in `[0, 1]`.
    fn predict_probability(&self, features: &FeatureVector) -> f64;

    /// Predicted label: 1 = churn, 0 = stay.
    fn predict(&self, features: &FeatureVector) -> u8;

    /// Features the classifier reads. Scoring fails with
    /// [`ScoringError::FeatureMismatch`] when a batch lacks any of them.
    fn required_features(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Per-feature attribution of a classifier's score.
pub trait Explainer: Send + Sync {
    /// Signed contribution of each feature, keyed by feature name.
    fn attribute(&self, features: &FeatureVector) -> BTreeMap<String, f64>;
}

fn default_name() -> String {
    "linear".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic model with fixed coefficients.
///
/// `p = sigmoid(intercept + sum(w_i * x_i))`; features without a coefficient
/// contribute nothing. Attribution is `w_i * (x_i - baseline_i)` with a
/// baseline of 0 for features that have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_name")]
    pub name: String,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub baseline: BTreeMap<String, f64>,
    /// Probability at or above which the prediction is 1.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

static_assertions::assert_impl_all!(LinearModel: Send, Sync);

impl LinearModel {
    /// Create a validated model with no baseline and a 0.5 threshold.
    pub fn new(intercept: f64, coefficients: BTreeMap<String, f64>) -> Result<Self, ScoringError> {
        let model = Self {
            name: default_name(),
            intercept,
            coefficients,
            baseline: BTreeMap::new(),
            threshold: default_threshold(),
        };
        model.validate()?;
        Ok(model)
    }

    #[must_use]
    pub fn with_baseline(mut self, baseline: BTreeMap<String, f64>) -> Self {
        self.baseline = baseline;
        self
    }

    /// Load a model from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::ModelNotFound`] when the file does not exist
    /// - [`ScoringError::Json`] when it is not a valid model document
    /// - [`ScoringError::InvalidModel`] when the values fail validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let model = Self::from_json_str(&content)?;
        info!(
            "Loaded model '{}' with {} coefficients from {}",
            model.name,
            model.coefficients.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScoringError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.coefficients.is_empty() {
            return Err(ScoringError::InvalidModel(
                "model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() {
            return Err(ScoringError::InvalidModel(
                "intercept must be finite".to_string(),
            ));
        }
        if let Some((name, _)) = self
            .coefficients
            .iter()
            .chain(self.baseline.iter())
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ScoringError::InvalidModel(format!(
                "value for '{name}' must be finite"
            )));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ScoringError::InvalidModel(format!(
                "threshold must be between 0.0 and 1.0 (exclusive), got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Linear score before the logistic link.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .map(|(name, weight)| weight * features.get(name).unwrap_or(0.0))
            .sum::<f64>()
            + self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LinearModel {
    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.decision_function(features))
    }

    fn predict(&self, features: &FeatureVector) -> u8 {
        u8::from(self.predict_probability(features) >= self.threshold)
    }

    fn required_features(&self) -> Vec<String> {
        self.coefficients.keys().cloned().collect()
    }
}

impl Explainer for LinearModel {
    fn attribute(&self, features: &FeatureVector) -> BTreeMap<String, f64> {
        features
            .iter()
            .map(|(name, value)| {
                let weight = self.coefficients.get(name).copied().unwrap_or(0.0);
                let base = self.baseline.get(name).copied().unwrap_or(0.0);
                (name.to_string(), weight * (value - base))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn vector(pairs: &[(&str, f64)]) -> FeatureVector {
        let names: Arc<[String]> = pairs.iter().map(|(n, _)| n.to_string()).collect();
        FeatureVector::new(names, pairs.iter().map(|(_, v)| *v).collect()).unwrap()
    }

    fn model() -> LinearModel {
        LinearModel::new(
            -1.0,
            BTreeMap::from([("tenure".to_string(), -0.1), ("contract".to_string(), 2.0)]),
        )
        .unwrap()
    }

    #[test]
    fn test_probability_and_prediction() {
        let model = model();
        let zero = vector(&[("tenure", 0.0), ("contract", 0.5)]);
        assert_eq!(model.decision_function(&zero), 0.0);
        assert_eq!(model.predict_probability(&zero), 0.5);
        assert_eq!(model.predict(&zero), 1);

        let loyal = vector(&[("tenure", 60.0), ("contract", 2.0)]);
        assert!(model.predict_probability(&loyal) < 0.5);
        assert_eq!(model.predict(&loyal), 0);
    }

    #[test]
    fn test_sigmoid_is_stable_for_large_inputs() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
    }

    #[test]
    fn test_attribution_against_baseline() {
        let model = model().with_baseline(BTreeMap::from([("tenure".to_string(), 10.0)]));
        let features = vector(&[("gender", 1.0), ("tenure", 30.0), ("contract", 1.0)]);
        let attribution = model.attribute(&features);

        assert_eq!(attribution.len(), 3);
        assert_eq!(attribution["gender"], 0.0);
        assert!((attribution["tenure"] - -2.0).abs() < 1e-12);
        assert_eq!(attribution["contract"], 2.0);
    }

    #[test]
    fn test_from_json_defaults() {
        let model = LinearModel::from_json_str(
            r#"{ "intercept": 0.3, "coefficients": { "tenure": -0.02 } }"#,
        )
        .unwrap();
        assert_eq!(model.name, "linear");
        assert_eq!(model.threshold, 0.5);
        assert!(model.baseline.is_empty());
        assert_eq!(model.required_features(), vec!["tenure".to_string()]);
    }

    #[test]
    fn test_invalid_models() {
        let err = LinearModel::from_json_str(r#"{ "intercept": 0.0, "coefficients": {} }"#)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_MODEL");

        let err = LinearModel::from_json_str(
            r#"{ "intercept": 0.0, "coefficients": { "tenure": 1.0 }, "threshold": 1.0 }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threshold"));

        let err = LinearModel::from_json_str(r#"{ "coefficients": { "tenure": 1.0 } }"#)
            .unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
    }

    #[test]
    fn test_load_missing_file() {
        let err = LinearModel::load("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ScoringError::ModelNotFound { .. }));
    }
}
