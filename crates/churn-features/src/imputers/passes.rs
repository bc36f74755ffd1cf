use super::statistical::StatisticalImputer;
use crate::config::FeatureContract;
use crate::schema::{CHURN, TOTAL_CHARGES};
use crate::types::{Cell, RawTable};
use tracing::{debug, info};

/// Counters from one imputation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputationReport {
    pub cells_imputed: usize,
    pub negatives_rejected: usize,
    /// `totalcharges` cells that did not parse as numbers.
    pub unparseable: usize,
    pub steps: Vec<String>,
}

/// The two imputation passes around derivation and projection.
pub struct MissingValueImputer;

impl MissingValueImputer {
    /// Pass 1: negative values in numeric columns become missing, then every
    /// numeric column is median-filled.
    ///
    /// The identifier and churn columns are not features and are skipped.
    pub fn first_pass(&self, table: &mut RawTable, contract: &FeatureContract) -> ImputationReport {
        let mut report = ImputationReport::default();

        for column in table.columns_mut() {
            if column.name == CHURN || column.name == contract.id_column || !column.is_numeric() {
                continue;
            }

            let mut negatives = 0;
            for cell in &mut column.cells {
                if matches!(cell, Cell::Number(v) if *v < 0.0) {
                    *cell = Cell::Missing;
                    negatives += 1;
                }
            }
            if negatives > 0 {
                debug!("Rejected {} negative values in '{}'", negatives, column.name);
                report
                    .steps
                    .push(format!("Treated {} negative values in '{}' as missing", negatives, column.name));
            }
            report.negatives_rejected += negatives;
            report.cells_imputed += StatisticalImputer::apply_numeric_median(column, &mut report.steps);
        }

        info!(
            "Pass 1: rejected {} negative values, imputed {} cells",
            report.negatives_rejected, report.cells_imputed
        );
        report
    }

    /// Pass 2: `totalcharges` is coerced to numeric and median-filled, other
    /// numeric columns are median-filled and text columns mode-filled.
    pub fn final_pass(&self, table: &mut RawTable) -> ImputationReport {
        let mut report = ImputationReport::default();

        if let Some(column) = table.column_mut(TOTAL_CHARGES) {
            for cell in &mut column.cells {
                if matches!(cell, Cell::Missing | Cell::Number(_)) {
                    continue;
                }
                *cell = match cell.to_number() {
                    Some(v) => Cell::Number(v),
                    None => {
                        report.unparseable += 1;
                        Cell::Missing
                    }
                };
            }
        }

        for column in table.columns_mut() {
            if column.name == CHURN {
                continue;
            }
            report.cells_imputed += if column.is_numeric() {
                StatisticalImputer::apply_numeric_median(column, &mut report.steps)
            } else {
                StatisticalImputer::apply_mode_imputation(column, &mut report.steps)
            };
        }

        info!(
            "Pass 2: imputed {} cells ({} unparseable totalcharges)",
            report.cells_imputed, report.unparseable
        );
        report
    }
}
