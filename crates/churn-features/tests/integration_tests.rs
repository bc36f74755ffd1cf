//! Integration tests for the churn feature pipeline.
//!
//! These tests verify end-to-end behavior of the pipeline on JSON records and
//! CSV fixtures.

use churn_features::{
    Cell, Column, FeatureBatch, FeatureContract, FeatureError, Pipeline, PipelineStage,
    ProgressUpdate, RawTable, ingest,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn default_pipeline() -> Pipeline {
    Pipeline::builder().build().unwrap()
}

fn column(batch: &FeatureBatch, name: &str) -> Vec<f64> {
    batch
        .column(name)
        .unwrap_or_else(|| panic!("missing feature column '{name}'"))
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch: {actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
    }
}

const THREE_ROW_BATCH: &str = r#"[
    {"sex": "male", "senior": 0, "tenureinyears": 1, "InternetService": "Yes",
     "Contract": "Month to month", "MonthlyCharges": 70, "TotalCharges": 840},
    {"sex": "female", "senior": 1, "tenureinyears": 2, "InternetService": "No",
     "Contract": "Two year", "MonthlyCharges": 20, "TotalCharges": 480},
    {"sex": "Male", "senior": "Yes", "tenureinyears": 0, "InternetService": "Yes",
     "Contract": "One year", "MonthlyCharges": 55, "TotalCharges": 0}
]"#;

// ============================================================================
// End-to-End Batches
// ============================================================================

#[test]
fn test_three_row_batch_projects_to_model_schema() {
    let result = default_pipeline().process_json(THREE_ROW_BATCH).unwrap();
    let batch = &result.batch;

    assert_eq!(batch.len(), 3);
    assert_eq!(
        batch.feature_names(),
        FeatureContract::default().model_features.as_slice()
    );
    assert!(batch.labels().is_none());

    assert_eq!(column(batch, "gender"), vec![0.0, 1.0, 0.0]);
    assert_eq!(column(batch, "seniorcitizen"), vec![0.0, 1.0, 1.0]);
    assert_eq!(column(batch, "tenure"), vec![12.0, 24.0, 0.0]);
    assert_eq!(column(batch, "contract"), vec![0.0, 2.0, 1.0]);
    assert_eq!(column(batch, "phoneservice"), vec![1.0, 0.0, 1.0]);
    assert_eq!(column(batch, "monthlycharges"), vec![70.0, 20.0, 55.0]);
    assert_eq!(column(batch, "totalcharges"), vec![840.0, 480.0, 0.0]);
    assert_eq!(column(batch, "partner"), vec![0.0, 0.0, 0.0]);
    assert_eq!(column(batch, "onlineservice"), vec![0.0, 0.0, 0.0]);
    assert_eq!(column(batch, "streaming"), vec![0.0, 0.0, 0.0]);

    let summary = &result.summary;
    assert_eq!(summary.rows_before, 3);
    assert_eq!(summary.rows_after, 3);
    assert_eq!(summary.rows_dropped, 0);
    assert_eq!(summary.defaulted_features, vec!["partner".to_string()]);
    assert!(summary.dropped_columns.contains(&"internetservice".to_string()));
    assert!(
        summary
            .renames
            .iter()
            .any(|r| r.raw_key == "tenureinyears" && r.canonical == "tenure" && r.converted_units)
    );
}

#[test]
fn test_pipeline_output_is_fixed_point() {
    let pipeline = default_pipeline();
    let first = pipeline.process_json(THREE_ROW_BATCH).unwrap();
    let second = pipeline.process(first.batch.to_raw_table()).unwrap();

    assert_eq!(second.batch, first.batch);
    assert_eq!(second.summary.cells_imputed, 0);
    assert_eq!(second.summary.ambiguous_values, 0);
    assert!(second.summary.defaulted_features.is_empty());
}

#[test]
fn test_labeled_fixed_point() {
    let pipeline = default_pipeline();
    let first = pipeline
        .process_file(fixtures_path().join("customers.csv"))
        .unwrap();
    let second = pipeline.process(first.batch.to_raw_table()).unwrap();

    assert_eq!(second.batch, first.batch);
    assert_eq!(second.summary.rows_dropped, 0);
}

// ============================================================================
// CSV Fixtures
// ============================================================================

#[test]
fn test_customers_csv_end_to_end() {
    let result = default_pipeline()
        .process_file(fixtures_path().join("customers.csv"))
        .unwrap();
    let batch = &result.batch;

    // C005 carries an unrecognized label; the rest are sorted by customerID
    assert_eq!(batch.len(), 4);
    assert_eq!(batch.labels(), Some(&[1u8, 0, 0, 1][..]));

    assert_eq!(column(batch, "gender"), vec![0.0, 0.0, 1.0, 1.0]);
    assert_eq!(column(batch, "seniorcitizen"), vec![1.0, 0.0, 0.0, 0.0]);
    assert_eq!(column(batch, "partner"), vec![0.0, 0.0, 1.0, 1.0]);
    // Pass-1 median over all five rows: [1, 10, 34, 45]
    assert_eq!(column(batch, "tenure"), vec![1.0, 22.0, 34.0, 45.0]);
    assert_eq!(column(batch, "phoneservice"), vec![1.0, 1.0, 2.0, 2.0]);
    assert_eq!(column(batch, "onlineservice"), vec![0.0, 0.0, 1.0, 1.0]);
    assert_eq!(column(batch, "streaming"), vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(column(batch, "contract"), vec![0.0, 2.0, 1.0, 0.0]);
    assert_close(
        &column(batch, "monthlycharges"),
        &[29.85, 63.475, 56.95, 104.8],
    );
    // "4,500.10" does not parse; pass-2 median over the labeled rows [29.85, 1889.5]
    assert_close(
        &column(batch, "totalcharges"),
        &[29.85, 959.675, 1889.5, 959.675],
    );

    let summary = &result.summary;
    assert_eq!(summary.rows_before, 5);
    assert_eq!(summary.rows_dropped, 1);
    assert_eq!(summary.negatives_rejected, 1);
    assert!(summary.sorted_by_id);
    assert!(summary.labeled);
    assert!(summary.dropped_columns.contains(&"customerid".to_string()));
}

#[test]
fn test_empty_file_is_malformed_input() {
    let err = ingest::load_table(fixtures_path().join("empty.csv")).unwrap_err();
    assert!(matches!(err, FeatureError::MalformedInput(_)), "got {err:?}");
    assert!(err.is_input_error());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = default_pipeline()
        .process_file(fixtures_path().join("does_not_exist.csv"))
        .unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_header_only_csv_is_malformed_input() {
    let err = ingest::read_csv_str("customerID,gender,tenure\n").unwrap_err();
    assert!(err.is_input_error());
}

// ============================================================================
// Single Records
// ============================================================================

#[test]
fn test_single_record_from_json_file() {
    let result = default_pipeline()
        .process_file(fixtures_path().join("single_record.json"))
        .unwrap();

    assert_eq!(result.batch.len(), 1);
    assert_eq!(
        result.batch.rows()[0].values(),
        &[1.0, 1.0, 1.0, 36.0, 2.0, 1.0, 0.0, 1.0, 89.5, 3222.0]
    );
    assert_eq!(
        result.summary.derived_features,
        vec!["seniorcitizen", "phoneservice", "onlineservice", "streaming"]
    );
}

#[test]
fn test_incomplete_single_record_uses_zero_fallback() {
    let result = default_pipeline()
        .process_json(r#"{"gender": "Male", "tenure": null, "MonthlyCharges": -3}"#)
        .unwrap();

    let row = &result.batch.rows()[0];
    assert_eq!(row.get("gender"), Some(0.0));
    assert_eq!(row.get("tenure"), Some(0.0));
    assert_eq!(row.get("monthlycharges"), Some(0.0));
    assert_eq!(result.summary.negatives_rejected, 1);
}

#[test]
fn test_non_tabular_json_is_malformed_input() {
    let pipeline = default_pipeline();
    for input in ["42", "[]", "[1, 2]", "{}", "not json"] {
        let err = pipeline.process_json(input).unwrap_err();
        assert!(err.is_input_error(), "{input} gave {err:?}");
    }
}

// ============================================================================
// Value Formats
// ============================================================================

#[test]
fn test_formatted_monthly_charges_are_textual() {
    let result = default_pipeline()
        .process_json(
            r#"[{"MonthlyCharges": "$70"}, {"MonthlyCharges": "$20"}, {"MonthlyCharges": "unknown"}]"#,
        )
        .unwrap();

    assert_eq!(column(&result.batch, "monthlycharges"), vec![1.0, 1.0, 0.0]);
}

#[test]
fn test_formatted_total_charges_become_median() {
    let result = default_pipeline()
        .process_json(
            r#"[{"TotalCharges": "4,500.10"}, {"TotalCharges": " 10 "}, {"TotalCharges": "$30"}]"#,
        )
        .unwrap();

    assert_eq!(column(&result.batch, "totalcharges"), vec![10.0, 10.0, 10.0]);
    assert_eq!(result.summary.ambiguous_values, 2);
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn test_churn_labels_mapped_and_unrecognized_dropped() {
    let result = default_pipeline()
        .process_json(
            r#"[
                {"tenure": 5, "Churn": "Churned"},
                {"tenure": 7, "Churn": "Active"},
                {"tenure": 9, "Churn": "Maybe"}
            ]"#,
        )
        .unwrap();

    assert_eq!(result.batch.labels(), Some(&[1u8, 0][..]));
    assert_eq!(column(&result.batch, "tenure"), vec![5.0, 7.0]);
    assert_eq!(result.summary.rows_dropped, 1);
}

#[test]
fn test_inference_batch_keeps_every_row() {
    let result = default_pipeline()
        .process_json(r#"[{"tenure": 5}, {"tenure": "??"}]"#)
        .unwrap();

    assert_eq!(result.batch.len(), 2);
    assert_eq!(result.summary.rows_dropped, 0);
    assert_eq!(column(&result.batch, "tenure"), vec![5.0, 5.0]);
}

// ============================================================================
// Custom Contracts
// ============================================================================

#[test]
fn test_custom_contract_threshold() {
    let contract = FeatureContract::builder()
        .senior_age_threshold(70.0)
        .build()
        .unwrap();
    let pipeline = Pipeline::builder().contract(contract).build().unwrap();

    let result = pipeline
        .process_json(r#"[{"age": 65}, {"age": 72}]"#)
        .unwrap();
    assert_eq!(column(&result.batch, "seniorcitizen"), vec![0.0, 1.0]);
}

#[test]
fn test_pipeline_is_reusable_across_batches() {
    let pipeline = default_pipeline();
    let a = pipeline.process_json(r#"{"tenure": 3}"#).unwrap();
    let b = pipeline.process_json(r#"[{"tenure": 1}, {"tenure": null}]"#).unwrap();
    let c = pipeline.process_json(r#"{"tenure": 3}"#).unwrap();

    assert_eq!(a.batch, c.batch);
    assert_eq!(column(&b.batch, "tenure"), vec![1.0, 1.0]);
}

#[test]
fn test_raw_table_input() {
    let table = RawTable::new(vec![
        Column::new("Sex", vec![Cell::text("Female"), Cell::Bool(true)]),
        Column::new("Contract", vec![Cell::text("two-year"), Cell::Missing]),
    ])
    .unwrap();
    let result = default_pipeline().process(table).unwrap();

    assert_eq!(column(&result.batch, "gender"), vec![1.0, 1.0]);
    assert_eq!(column(&result.batch, "contract"), vec![2.0, 2.0]);
    assert_eq!(result.summary.ambiguous_values, 1);
}

// ============================================================================
// Progress Reporting
// ============================================================================

#[test]
fn test_progress_reaches_complete_in_order() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);

    let pipeline = Pipeline::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .unwrap();
    pipeline.process_json(THREE_ROW_BATCH).unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().map(|u| u.stage), Some(PipelineStage::Initializing));
    assert_eq!(updates.last().map(|u| u.stage), Some(PipelineStage::Complete));
    assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
}
