use crate::error::FeatureError;
use crate::types::{AliasRename, FeatureBatch, PipelineResult};
use anyhow::{Context, Result};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Unified report of one pipeline run.
///
/// Used for both JSON output to stdout and report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Input file path, or "<inline>" for a record passed on the command line
    pub input_file: String,
    /// Path to the feature CSV (if written)
    pub output_file: Option<String>,

    /// Row and cell counters
    pub processing_summary: ProcessingSummaryReport,

    /// Feature columns in the order the classifier consumes them
    pub feature_names: Vec<String>,
    /// Raw keys renamed to canonical names
    pub alias_renames: Vec<AliasRename>,
    /// Model features absent from the input and filled with 0
    pub defaulted_features: Vec<String>,
    /// Features computed from other columns
    pub derived_features: Vec<String>,
    /// Input columns outside the model schema
    pub dropped_columns: Vec<String>,

    /// Scoring results, when a model was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<serde_json::Value>,
}

/// Summary of processing for the comprehensive report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    /// Number of rows before processing
    pub rows_before: usize,
    /// Number of rows in the feature batch
    pub rows_after: usize,
    /// Rows removed for unrecognized churn labels
    pub rows_dropped: usize,
    /// Percentage of rows removed
    pub rows_dropped_percent: f32,
    /// Number of input columns
    pub columns_before: usize,
    /// Number of feature columns
    pub columns_after: usize,
    pub cells_imputed: usize,
    pub negatives_rejected: usize,
    pub ambiguous_values: usize,
    pub sorted_by_id: bool,
    pub labeled: bool,
    /// Warnings generated during processing
    pub warnings: Vec<String>,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Base name used for written files: the custom name, or `fallback`.
    pub fn base_name(&self, fallback: &str) -> String {
        self.output_name
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Write the feature batch as CSV, label column last.
    pub fn write_features_csv(&self, batch: &FeatureBatch, fallback_name: &str) -> Result<PathBuf> {
        let mut df = batch
            .to_dataframe()
            .context("Converting feature batch to a DataFrame")?;

        fs::create_dir_all(&self.output_dir).map_err(|e| generation_failed(&self.output_dir, e))?;
        let output_path = self
            .output_dir
            .join(format!("{}.csv", self.base_name(fallback_name)));
        let mut file = File::create(&output_path).map_err(|e| generation_failed(&output_path, e))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)
            .map_err(|e| generation_failed(&output_path, e))?;

        info!("Features saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Build a comprehensive report from pipeline results.
    pub fn build_comprehensive_report(
        input_file: &str,
        output_file: Option<&str>,
        result: &PipelineResult,
        scoring: Option<serde_json::Value>,
    ) -> ComprehensiveReport {
        let summary = &result.summary;

        let processing_summary = ProcessingSummaryReport {
            duration_ms: summary.duration_ms,
            rows_before: summary.rows_before,
            rows_after: summary.rows_after,
            rows_dropped: summary.rows_dropped,
            rows_dropped_percent: summary.rows_dropped_percentage(),
            columns_before: summary.columns_before,
            columns_after: result.batch.feature_names().len(),
            cells_imputed: summary.cells_imputed,
            negatives_rejected: summary.negatives_rejected,
            ambiguous_values: summary.ambiguous_values,
            sorted_by_id: summary.sorted_by_id,
            labeled: summary.labeled,
            warnings: summary.warnings.clone(),
        };

        ComprehensiveReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            processing_summary,
            feature_names: result.batch.feature_names().to_vec(),
            alias_renames: summary.renames.clone(),
            defaulted_features: summary.defaulted_features.clone(),
            derived_features: summary.derived_features.clone(),
            dropped_columns: summary.dropped_columns.clone(),
            scoring,
        }
    }

    /// Write a comprehensive report to `<base>_report.json` in the output
    /// directory.
    pub fn write_report_to_file(
        &self,
        report: &ComprehensiveReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

fn generation_failed(path: &Path, err: impl std::fmt::Display) -> FeatureError {
    FeatureError::ReportGenerationFailed(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PipelineSummary;
    use pretty_assertions::assert_eq;

    fn sample_result() -> PipelineResult {
        let batch = FeatureBatch::new(
            vec!["gender".to_string(), "tenure".to_string()],
            vec![vec![0.0, 12.0], vec![1.0, 24.0]],
            Some(vec![1, 0]),
        )
        .unwrap();
        let mut summary = PipelineSummary::new();
        summary.rows_before = 3;
        summary.rows_after = 2;
        summary.rows_dropped = 1;
        summary.labeled = true;
        PipelineResult { batch, summary }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("churn_features_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_build_comprehensive_report() {
        let result = sample_result();
        let report = ReportGenerator::build_comprehensive_report("in.csv", None, &result, None);

        assert_eq!(report.input_file, "in.csv");
        assert_eq!(report.feature_names, vec!["gender", "tenure"]);
        assert_eq!(report.processing_summary.rows_dropped, 1);
        assert_eq!(report.processing_summary.columns_after, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("scoring").is_none());
        assert!(json.get("generated_at").is_some());
    }

    #[test]
    fn test_write_features_csv() {
        let dir = temp_dir("csv");
        let generator = ReportGenerator::new(dir.clone(), Some("features".to_string()));
        let path = generator
            .write_features_csv(&sample_result().batch, "unused")
            .unwrap();

        assert_eq!(path, dir.join("features.csv"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some("gender,tenure,churn"));
        assert_eq!(content.lines().count(), 3);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_features_csv_into_a_file_path_fails() {
        let dir = temp_dir("blocked");
        fs::write(&dir, "not a directory").unwrap();
        let generator = ReportGenerator::new(dir.clone(), None);

        let err = generator
            .write_features_csv(&sample_result().batch, "features")
            .unwrap_err();
        let err = err.downcast_ref::<FeatureError>().unwrap();
        assert_eq!(err.error_code(), "REPORT_GENERATION_FAILED");
        fs::remove_file(&dir).unwrap();
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = temp_dir("report");
        let generator = ReportGenerator::new(dir.clone(), None);
        let report = ReportGenerator::build_comprehensive_report(
            "in.csv",
            None,
            &sample_result(),
            Some(serde_json::json!({ "total_customers": 2 })),
        );
        let path = generator.write_report_to_file(&report, "run").unwrap();

        let parsed: ComprehensiveReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.scoring.unwrap()["total_customers"], 2);
        fs::remove_dir_all(&dir).unwrap();
    }
}
