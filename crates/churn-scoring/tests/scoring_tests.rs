//! End-to-end tests: feature pipeline output scored with the reference model.

use churn_features::{FeatureContract, Pipeline, ReportGenerator};
use churn_scoring::{
    BatchSummary, Classifier, LinearModel, RiskLevel, Scorer, ScoringConfig, ScoringError,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn reference_model() -> LinearModel {
    LinearModel::load(fixtures_path().join("linear_model.json")).unwrap()
}

const TWO_CUSTOMERS: &str = r#"[
    {"gender": "Female", "SeniorCitizen": 1, "tenure": 1, "PhoneService": "Yes",
     "InternetService": "Fiber optic", "Contract": "Month-to-month",
     "MonthlyCharges": 95, "TotalCharges": 95},
    {"gender": "Male", "SeniorCitizen": 0, "Partner": "Yes", "tenure": 70,
     "Contract": "Two year", "MonthlyCharges": 25, "TotalCharges": 1750}
]"#;

#[test]
fn test_reference_model_covers_model_schema() {
    let model = reference_model();
    let contract = FeatureContract::default();

    assert_eq!(model.name, "churn-logit-reference");
    assert_eq!(model.required_features().len(), contract.model_features.len());
    for feature in &contract.model_features {
        assert!(model.coefficients.contains_key(feature), "no coefficient for {feature}");
    }
}

#[test]
fn test_pipeline_batch_scored_end_to_end() {
    let result = Pipeline::builder()
        .build()
        .unwrap()
        .process_json(TWO_CUSTOMERS)
        .unwrap();
    let scorer = Scorer::from_linear(reference_model(), ScoringConfig::default());
    let (records, summary) = scorer.score_and_summarize(&result.batch).unwrap();

    assert_eq!(records.len(), 2);

    let at_risk = &records[0];
    assert_eq!(at_risk.prediction, 1);
    assert_eq!(at_risk.risk, RiskLevel::High);
    assert_eq!(at_risk.attribution.len(), 10);
    assert!((at_risk.attribution["tenure"] - 1.86).abs() < 1e-9);

    let loyal = &records[1];
    assert_eq!(loyal.prediction, 0);
    assert_eq!(loyal.risk, RiskLevel::Low);
    assert!(loyal.attribution["contract"] < 0.0);

    for record in &records {
        let scaled = record.probability * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-6, "{} not rounded", record.probability);
    }

    assert_eq!(summary.total_customers, 2);
    assert_eq!(summary.predicted_churners, 1);
    assert_eq!(summary.churn_rate, 50.0);
    assert_eq!(summary.risk_distribution.high, 1);
    assert_eq!(summary.risk_distribution.low, 1);
}

#[test]
fn test_single_record_response() {
    let result = Pipeline::builder()
        .build()
        .unwrap()
        .process_json(r#"{"tenure": 48, "Contract": "One year", "MonthlyCharges": 60}"#)
        .unwrap();
    let scorer = Scorer::from_linear(reference_model(), ScoringConfig::default());
    let record = scorer.score(&result.batch.rows()[0]).unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["prediction"], 0);
    assert!(json["probability"].as_f64().is_some());
    assert_eq!(json["risk"], "low");
    assert!(json["attribution"].get("contract").is_some());
}

#[test]
fn test_batch_without_defaults_is_a_feature_mismatch() {
    let contract = FeatureContract::builder()
        .fill_absent_features(false)
        .build()
        .unwrap();
    let result = Pipeline::builder()
        .contract(contract)
        .build()
        .unwrap()
        .process_json(r#"{"tenure": 5}"#)
        .unwrap();
    let scorer = Scorer::from_linear(reference_model(), ScoringConfig::default());

    match scorer.score_batch(&result.batch) {
        Err(ScoringError::FeatureMismatch { missing }) => {
            assert!(missing.contains(&"partner".to_string()));
            assert!(!missing.contains(&"tenure".to_string()));
        }
        other => panic!("expected feature mismatch, got {other:?}"),
    }
}

#[test]
fn test_summary_embedded_in_report() {
    let result = Pipeline::builder()
        .build()
        .unwrap()
        .process_json(TWO_CUSTOMERS)
        .unwrap();
    let scorer = Scorer::from_linear(reference_model(), ScoringConfig::default());
    let records = scorer.score_batch(&result.batch).unwrap();
    let summary = BatchSummary::from_records(&records);

    let report = ReportGenerator::build_comprehensive_report(
        "<inline>",
        None,
        &result,
        Some(serde_json::to_value(&summary).unwrap()),
    );
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["scoring"]["total_customers"], 2);
    assert_eq!(json["scoring"]["risk_distribution"]["high"], 1);
}
