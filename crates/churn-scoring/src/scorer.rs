//! Response assembly: prediction, rounded probability, risk tier and
//! attribution for single vectors and batches.

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::model::{Classifier, Explainer, LinearModel};
use crate::types::{BatchSummary, RiskLevel, ScoredRecord};
use churn_features::{FeatureBatch, FeatureVector};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Scores feature vectors with a classifier and an optional explainer.
///
/// # Example
///
/// ```rust,ignore
/// use churn_scoring::{LinearModel, Scorer, ScoringConfig};
///
/// let scorer = Scorer::from_linear(LinearModel::load("model.json")?, ScoringConfig::default());
/// let records = scorer.score_batch(&result.batch)?;
/// let summary = churn_scoring::BatchSummary::from_records(&records);
/// ```
pub struct Scorer {
    classifier: Arc<dyn Classifier>,
    explainer: Option<Arc<dyn Explainer>>,
    config: ScoringConfig,
}

static_assertions::assert_impl_all!(Scorer: Send, Sync);

impl Scorer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        explainer: Option<Arc<dyn Explainer>>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            classifier,
            explainer,
            config,
        }
    }

    /// A linear model acts as both classifier and explainer.
    pub fn from_linear(model: LinearModel, config: ScoringConfig) -> Self {
        let model = Arc::new(model);
        let explainer: Arc<dyn Explainer> = model.clone();
        Self::new(model, Some(explainer), config)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Fail when the classifier reads features that `names` does not carry.
    pub fn check_features(&self, names: &[String]) -> Result<(), ScoringError> {
        let missing: Vec<String> = self
            .classifier
            .required_features()
            .into_iter()
            .filter(|f| !names.contains(f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScoringError::FeatureMismatch { missing })
        }
    }

    /// Score one feature vector.
    pub fn score(&self, features: &FeatureVector) -> Result<ScoredRecord, ScoringError> {
        self.check_features(features.names())?;
        Ok(self.score_unchecked(features))
    }

    /// Score every row of a batch, in row order.
    pub fn score_batch(&self, batch: &FeatureBatch) -> Result<Vec<ScoredRecord>, ScoringError> {
        self.check_features(batch.feature_names())?;

        let records: Vec<ScoredRecord> =
            batch.rows().iter().map(|row| self.score_unchecked(row)).collect();

        info!(
            "Scored {} records ({} predicted churners)",
            records.len(),
            records.iter().filter(|r| r.prediction == 1).count()
        );
        Ok(records)
    }

    /// Score a batch and summarize it.
    pub fn score_and_summarize(
        &self,
        batch: &FeatureBatch,
    ) -> Result<(Vec<ScoredRecord>, BatchSummary), ScoringError> {
        let records = self.score_batch(batch)?;
        let summary = BatchSummary::from_records(&records);
        Ok((records, summary))
    }

    fn score_unchecked(&self, features: &FeatureVector) -> ScoredRecord {
        let raw = self.classifier.predict_probability(features).clamp(0.0, 1.0);
        let probability = self.config.round_probability(raw);
        let attribution = match (&self.explainer, self.config.explain) {
            (Some(explainer), true) => explainer.attribute(features),
            _ => BTreeMap::new(),
        };
        let record = ScoredRecord {
            prediction: self.classifier.predict(features),
            probability,
            risk: RiskLevel::from_probability(raw, &self.config),
            attribution,
        };
        debug!("Scored record: {:?}", record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Classifier returning a fixed probability, without an explainer.
    struct Constant(f64);

    impl Classifier for Constant {
        fn predict_probability(&self, _features: &FeatureVector) -> f64 {
            self.0
        }

        fn predict(&self, _features: &FeatureVector) -> u8 {
            u8::from(self.0 >= 0.5)
        }
    }

    fn batch() -> FeatureBatch {
        FeatureBatch::new(
            vec!["tenure".to_string(), "contract".to_string()],
            vec![vec![1.0, 0.0], vec![60.0, 2.0]],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_probability_rounded_to_four_places() {
        let scorer = Scorer::new(Arc::new(Constant(0.123456)), None, ScoringConfig::default());
        let record = scorer.score(&batch().rows()[0]).unwrap();

        assert_eq!(record.probability, 0.1235);
        assert_eq!(record.prediction, 0);
        assert_eq!(record.risk, RiskLevel::Low);
        assert!(record.attribution.is_empty());
    }

    #[test]
    fn test_risk_uses_unrounded_probability() {
        let scorer = Scorer::new(Arc::new(Constant(0.70004)), None, ScoringConfig::default());
        let record = scorer.score(&batch().rows()[0]).unwrap();

        assert_eq!(record.probability, 0.7);
        assert_eq!(record.risk, RiskLevel::High);
    }

    #[test]
    fn test_score_batch_with_linear_model() {
        let model = LinearModel::new(
            0.5,
            BTreeMap::from([("tenure".to_string(), -0.1), ("contract".to_string(), -1.0)]),
        )
        .unwrap();
        let scorer = Scorer::from_linear(model, ScoringConfig::default());
        let (records, summary) = scorer.score_and_summarize(&batch()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prediction, 1);
        assert_eq!(records[1].prediction, 0);
        assert_eq!(records[0].attribution.len(), 2);
        assert_eq!(summary.total_customers, 2);
        assert_eq!(summary.predicted_churners, 1);
    }

    #[test]
    fn test_explanations_can_be_disabled() {
        let model = LinearModel::new(0.0, BTreeMap::from([("tenure".to_string(), 1.0)])).unwrap();
        let config = ScoringConfig::builder().explain(false).build().unwrap();
        let records = Scorer::from_linear(model, config).score_batch(&batch()).unwrap();
        assert!(records.iter().all(|r| r.attribution.is_empty()));
    }

    #[test]
    fn test_feature_mismatch() {
        let model = LinearModel::new(0.0, BTreeMap::from([("age".to_string(), 1.0)])).unwrap();
        let scorer = Scorer::from_linear(model, ScoringConfig::default());

        match scorer.score_batch(&batch()) {
            Err(ScoringError::FeatureMismatch { missing }) => {
                assert_eq!(missing, vec!["age".to_string()])
            }
            other => panic!("expected feature mismatch, got {other:?}"),
        }
    }
}
