//! Report generation module.
//!
//! This module writes the feature batch as CSV and builds the run report.
//!
//! # Comprehensive Reports
//!
//! Use [`ComprehensiveReport`] for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use churn_features::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_comprehensive_report(
//!     "data/customers.csv",
//!     Some("output/features.csv"),
//!     &pipeline_result,
//!     None,
//! );
//!
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod generator;

pub use generator::{ComprehensiveReport, ProcessingSummaryReport, ReportGenerator};
