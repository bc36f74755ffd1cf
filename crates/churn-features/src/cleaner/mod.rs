//! Schema cleaning stages.
//!
//! This module provides:
//! - Column key normalization
//! - Greedy alias resolution onto canonical feature names
//! - Per-feature value coercion
//! - The row stages (identifier sort, churn-label cleaning)

mod aliases;
mod coercion;
mod keys;
mod rows;

pub use aliases::{AliasResolution, AliasResolver};
pub use coercion::{CoercionReport, ValueCoercer};
pub use keys::{KeyNormalizer, normalize_key};
pub use rows::RowStages;
