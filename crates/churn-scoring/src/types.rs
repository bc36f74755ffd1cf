//! Result types returned by the scorer.
//!
//! - [`RiskLevel`]: risk tier of a churn probability
//! - [`ScoredRecord`]: prediction, rounded probability, tier and attribution for one row
//! - [`BatchSummary`]: aggregate view over a scored batch

use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Risk tier of a churn probability.
///
/// Tiers use strict comparisons: a probability exactly at a threshold falls
/// into the lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for `probability` under the configured thresholds.
    pub fn from_probability(probability: f64, config: &ScoringConfig) -> Self {
        if probability > config.high_risk_threshold {
            RiskLevel::High
        } else if probability > config.medium_risk_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Retention action suggested for customers in this tier.
    #[must_use]
    pub fn recommended_action(&self) -> &'static str {
        match self {
            RiskLevel::High => "Immediate intervention required - Deploy retention specialist",
            RiskLevel::Medium => "Proactive engagement - Offer loyalty incentives",
            RiskLevel::Low => "Maintain satisfaction - Regular check-ins",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring response for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Predicted label: 1 = churn, 0 = stay.
    pub prediction: u8,

    /// Probability of churn, rounded to the configured decimals.
    pub probability: f64,

    pub risk: RiskLevel,

    /// Signed contribution of each feature to the score.
    ///
    /// Empty when explanations are disabled.
    pub attribution: BTreeMap<String, f64>,
}

/// Count of records per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate view over a scored batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_customers: usize,

    /// Records predicted to churn.
    pub predicted_churners: usize,

    /// Predicted churners as a percentage of the batch.
    pub churn_rate: f64,

    /// Mean churn probability as a percentage.
    pub average_probability: f64,

    pub risk_distribution: RiskDistribution,
}

impl BatchSummary {
    /// Summarize `records`. An empty batch yields all zeros.
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        let total = records.len();
        if total == 0 {
            return Self::default();
        }

        let mut distribution = RiskDistribution::default();
        for record in records {
            match record.risk {
                RiskLevel::High => distribution.high += 1,
                RiskLevel::Medium => distribution.medium += 1,
                RiskLevel::Low => distribution.low += 1,
            }
        }

        let churners = records.iter().filter(|r| r.prediction == 1).count();
        let probability_sum: f64 = records.iter().map(|r| r.probability).sum();

        Self {
            total_customers: total,
            predicted_churners: churners,
            churn_rate: churners as f64 / total as f64 * 100.0,
            average_probability: probability_sum / total as f64 * 100.0,
            risk_distribution: distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(prediction: u8, probability: f64) -> ScoredRecord {
        ScoredRecord {
            prediction,
            probability,
            risk: RiskLevel::from_probability(probability, &ScoringConfig::default()),
            attribution: BTreeMap::new(),
        }
    }

    #[test]
    fn test_risk_tiers_are_strict() {
        let config = ScoringConfig::default();
        assert_eq!(RiskLevel::from_probability(0.71, &config), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.7, &config), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.41, &config), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.4, &config), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.0, &config), RiskLevel::Low);
    }

    #[test]
    fn test_risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
        assert_eq!(RiskLevel::Medium.to_string(), "medium");
    }

    #[test]
    fn test_batch_summary() {
        let records = vec![record(1, 0.9), record(1, 0.6), record(0, 0.2), record(0, 0.1)];
        let summary = BatchSummary::from_records(&records);

        assert_eq!(summary.total_customers, 4);
        assert_eq!(summary.predicted_churners, 2);
        assert_eq!(summary.churn_rate, 50.0);
        assert!((summary.average_probability - 45.0).abs() < 1e-9);
        assert_eq!(
            summary.risk_distribution,
            RiskDistribution {
                high: 1,
                medium: 1,
                low: 2
            }
        );
    }

    #[test]
    fn test_empty_batch_summary() {
        assert_eq!(BatchSummary::from_records(&[]), BatchSummary::default());
    }
}
