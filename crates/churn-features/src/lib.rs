//! Churn Feature Pipeline Library
//!
//! Schema normalization and feature engineering for customer-churn
//! classifiers, built with Rust and Polars.
//!
//! # Overview
//!
//! Raw customer records arrive with inconsistent column names, mixed value
//! encodings and gaps. This library turns them into a fixed, fully numeric
//! feature schema:
//!
//! - **Key Normalization**: Lowercases keys and strips non-alphanumerics
//! - **Alias Resolution**: Maps known spellings onto canonical feature names
//! - **Value Coercion**: Encodes yes/no, gender, contract and service text as numbers
//! - **Imputation**: Median for numeric columns, mode for the rest
//! - **Row Stages**: Sorts by customer id and drops unrecognized churn labels
//! - **Feature Derivation**: Senior-citizen flag and service aggregates
//! - **Projection**: Selects and orders the model schema
//! - **Progress Reporting**: Stage-by-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use churn_features::{Pipeline, RawTable};
//!
//! let table = RawTable::from_json_str(r#"[
//!     {"sex": "Male", "tenureInYears": 1, "Contract": "Month-to-month"}
//! ]"#)?;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(table)?;
//!
//! for row in result.batch.rows() {
//!     println!("{:?}", row.values());
//! }
//! ```
//!
//! # Configuration
//!
//! The alias table, vocabularies and model schema live in a
//! [`FeatureContract`]. The default contract matches the churn model; a
//! custom one can be built or read from JSON:
//!
//! ```rust,ignore
//! use churn_features::FeatureContract;
//!
//! let contract = FeatureContract::builder()
//!     .senior_age_threshold(65.0)
//!     .fill_absent_features(false)
//!     .build()?;
//!
//! let from_file = FeatureContract::from_json_file("contract.json")?;
//! ```

pub mod cleaner;
pub mod config;
pub mod derived;
pub mod error;
pub mod imputers;
pub mod ingest;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{AliasEntry, ConfigValidationError, FeatureContract, FeatureContractBuilder};
pub use error::{FeatureError, Result as FeatureResult, ResultExt};
pub use ingest::{load_csv, load_table};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::{ComprehensiveReport, ProcessingSummaryReport, ReportGenerator};
pub use types::{
    AliasRename, Cell, Column, FeatureBatch, FeatureVector, PipelineResult, PipelineSummary,
    RawTable, RowStageOutcome,
};
