//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Statistical imputation (median, mode) with a 0 fallback
//! - The two-pass missing value imputer used by the pipeline

mod passes;
mod statistical;

pub use passes::{ImputationReport, MissingValueImputer};
pub use statistical::{FALLBACK_FILL, StatisticalImputer};
