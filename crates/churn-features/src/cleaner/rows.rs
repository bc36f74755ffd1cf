//! Row-count and row-order changing stages.
//!
//! These run separately from the column transforms so callers can assert on
//! the number of rows they remove.

use crate::config::FeatureContract;
use crate::error::Result;
use crate::schema::CHURN;
use crate::types::{Cell, Column, RawTable, RowStageOutcome};
use std::cmp::Ordering;
use tracing::{debug, info};

pub struct RowStages;

impl RowStages {
    /// Stable ascending sort on the identifier column, when present.
    ///
    /// Numbers compare numerically and sort before text; text compares
    /// lexicographically; missing identifiers sort last. Returns `None` when
    /// the table has no identifier column.
    pub fn sort_by_id(&self, table: &RawTable, contract: &FeatureContract) -> Option<RowStageOutcome> {
        let ids = &table.column(&contract.id_column)?.cells;
        let mut order: Vec<usize> = (0..table.height()).collect();
        order.sort_by(|&a, &b| compare_ids(&ids[a], &ids[b]));
        debug!("Sorted {} rows by '{}'", order.len(), contract.id_column);
        Some(RowStageOutcome {
            table: table.take_rows(&order),
            dropped: 0,
        })
    }

    /// Map churn labels to 1/0 and drop rows whose label is unrecognized or
    /// missing. Returns `None` when the table has no churn column, so
    /// inference batches are never touched.
    pub fn clean_churn_labels(
        &self,
        table: &RawTable,
        contract: &FeatureContract,
    ) -> Result<Option<RowStageOutcome>> {
        let Some(column) = table.column(CHURN) else {
            return Ok(None);
        };

        let mut keep = Vec::with_capacity(table.height());
        let mut labels = Vec::with_capacity(table.height());
        for (row, cell) in column.cells.iter().enumerate() {
            let value = cell.render().map(|s| s.trim().to_lowercase());
            let label = match value {
                Some(v) if contract.positive_labels.contains(&v) => 1.0,
                Some(v) if contract.negative_labels.contains(&v) => 0.0,
                _ => {
                    debug!("Dropping row {} with unrecognized churn label {:?}", row, cell);
                    continue;
                }
            };
            keep.push(row);
            labels.push(Cell::Number(label));
        }

        let dropped = table.height() - keep.len();
        let mut cleaned = table.take_rows(&keep);
        cleaned.set_column(Column::new(CHURN, labels))?;
        if dropped > 0 {
            info!("Dropped {} rows with unrecognized churn labels", dropped);
        }

        Ok(Some(RowStageOutcome {
            table: cleaned,
            dropped,
        }))
    }
}

fn id_rank(cell: &Cell) -> u8 {
    match cell {
        Cell::Number(_) => 0,
        Cell::Text(_) | Cell::Bool(_) => 1,
        Cell::Missing => 2,
    }
}

fn compare_ids(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.total_cmp(y),
        (Cell::Missing, Cell::Missing) => Ordering::Equal,
        _ if id_rank(a) == id_rank(b) => a.render().cmp(&b.render()),
        _ => id_rank(a).cmp(&id_rank(b)),
    }
}
