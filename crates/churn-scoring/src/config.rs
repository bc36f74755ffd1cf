//! Configuration for scoring: risk tier thresholds and output rounding.
//!
//! # Example
//!
//! ```
//! use churn_scoring::ScoringConfig;
//!
//! let config = ScoringConfig::builder()
//!     .high_risk_threshold(0.8)
//!     .medium_risk_threshold(0.5)
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::ScoringError;

/// Configuration for a [`Scorer`](crate::Scorer).
///
/// # Validation
///
/// The builder validates the following constraints on [`build()`](ScoringConfigBuilder::build):
/// - both thresholds must lie in `[0.0, 1.0]`
/// - `medium_risk_threshold` must be below `high_risk_threshold`
/// - `probability_decimals` must be at most 10
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Probabilities strictly above this are high risk (default: 0.7).
    pub high_risk_threshold: f64,

    /// Probabilities strictly above this, and not high, are medium risk
    /// (default: 0.4).
    pub medium_risk_threshold: f64,

    /// Decimal places kept on reported probabilities (default: 4).
    pub probability_decimals: u32,

    /// Whether scored records carry a per-feature attribution map
    /// (default: true).
    pub explain: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_risk_threshold: 0.7,
            medium_risk_threshold: 0.4,
            probability_decimals: 4,
            explain: true,
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }

    /// Round a probability to the configured number of decimals.
    pub fn round_probability(&self, probability: f64) -> f64 {
        let factor = 10f64.powi(self.probability_decimals as i32);
        (probability * factor).round() / factor
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    #[must_use]
    pub fn high_risk_threshold(mut self, threshold: f64) -> Self {
        self.config.high_risk_threshold = threshold;
        self
    }

    #[must_use]
    pub fn medium_risk_threshold(mut self, threshold: f64) -> Self {
        self.config.medium_risk_threshold = threshold;
        self
    }

    #[must_use]
    pub fn probability_decimals(mut self, decimals: u32) -> Self {
        self.config.probability_decimals = decimals;
        self
    }

    #[must_use]
    pub fn explain(mut self, explain: bool) -> Self {
        self.config.explain = explain;
        self
    }

    pub fn build(self) -> Result<ScoringConfig, ScoringError> {
        let config = self.config;

        for (name, value) in [
            ("high_risk_threshold", config.high_risk_threshold),
            ("medium_risk_threshold", config.medium_risk_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoringError::InvalidConfig(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }

        if config.medium_risk_threshold >= config.high_risk_threshold {
            return Err(ScoringError::InvalidConfig(
                "medium_risk_threshold must be below high_risk_threshold".to_string(),
            ));
        }

        if config.probability_decimals > 10 {
            return Err(ScoringError::InvalidConfig(
                "probability_decimals must be at most 10".to_string(),
            ));
        }

        Ok(config)
    }
}
