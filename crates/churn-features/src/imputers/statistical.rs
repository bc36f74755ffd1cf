//! Statistical imputation methods.
//!
//! Median fill for numeric columns and mode fill for text columns, both
//! computed over the batch being processed. A column with no observed values
//! falls back to 0.

use crate::types::{Cell, Column};
use crate::utils::{median, string_mode};
use tracing::{debug, warn};

/// Value used when a column has nothing to compute a statistic from.
pub const FALLBACK_FILL: f64 = 0.0;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing cells of a numeric column with its median.
    ///
    /// Returns the number of filled cells.
    pub fn apply_numeric_median(column: &mut Column, processing_steps: &mut Vec<String>) -> usize {
        let missing = column.missing_count();
        if missing == 0 {
            return 0;
        }
        let (fill, method) = match median(&column.numbers()) {
            Some(value) => (value, "median"),
            None => {
                warn!("Column '{}' has no values, filling with {}", column.name, FALLBACK_FILL);
                (FALLBACK_FILL, "fallback")
            }
        };
        Self::fill_with(column, Cell::Number(fill));
        processing_steps.push(format!(
            "Imputed {} missing values in '{}' with {} ({})",
            missing, column.name, method, fill
        ));
        debug!("Filled {} cells of '{}' with {}", missing, column.name, fill);
        missing
    }

    /// Fill missing cells of a text column with its most frequent value.
    ///
    /// Returns the number of filled cells.
    pub fn apply_mode_imputation(column: &mut Column, processing_steps: &mut Vec<String>) -> usize {
        let missing = column.missing_count();
        if missing == 0 {
            return 0;
        }
        let rendered: Vec<String> = column.cells.iter().filter_map(Cell::render).collect();
        let fill = match string_mode(rendered.iter().map(String::as_str)) {
            Some(mode) => {
                processing_steps.push(format!(
                    "Imputed {} missing values in '{}' with mode ('{}')",
                    missing, column.name, mode
                ));
                Cell::Text(mode)
            }
            None => {
                warn!("Column '{}' has no values, filling with {}", column.name, FALLBACK_FILL);
                processing_steps.push(format!(
                    "Imputed {} missing values in '{}' with fallback ({})",
                    missing, column.name, FALLBACK_FILL
                ));
                Cell::Number(FALLBACK_FILL)
            }
        };
        Self::fill_with(column, fill);
        missing
    }

    fn fill_with(column: &mut Column, value: Cell) {
        for cell in column.cells.iter_mut().filter(|c| c.is_missing()) {
            *cell = value.clone();
        }
    }
}
