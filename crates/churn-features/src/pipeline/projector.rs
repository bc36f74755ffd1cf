use crate::config::FeatureContract;
use crate::error::Result;
use crate::schema::CHURN;
use crate::types::{Cell, Column, FeatureBatch, RawTable};
use tracing::{debug, warn};

/// Result of projecting a table onto the model schema.
#[derive(Debug, Clone)]
pub struct Projection {
    pub table: RawTable,
    /// Model features absent from the input and filled with 0.
    pub defaulted: Vec<String>,
    /// Columns removed because they are not part of the model schema.
    pub dropped: Vec<String>,
}

/// Selects and orders the model schema columns.
pub struct SchemaProjector;

impl SchemaProjector {
    /// Keep the model features in declared order, then `churn` when the
    /// batch is labeled. Everything else is dropped.
    pub fn project(&self, table: RawTable, contract: &FeatureContract, labeled: bool) -> Projection {
        let height = table.height();
        let mut columns = table.into_columns();
        let mut selected = Vec::with_capacity(contract.model_features.len() + 1);
        let mut defaulted = Vec::new();

        for feature in &contract.model_features {
            match columns.iter().position(|c| &c.name == feature) {
                Some(idx) => selected.push(columns.remove(idx)),
                None if contract.fill_absent_features => {
                    debug!("Model feature '{}' absent, filling with 0", feature);
                    defaulted.push(feature.clone());
                    selected.push(Column::constant(feature.clone(), 0.0, height));
                }
                None => warn!("Model feature '{}' absent from input", feature),
            }
        }

        if labeled {
            if let Some(idx) = columns.iter().position(|c| c.name == CHURN) {
                selected.push(columns.remove(idx));
            }
        }

        let dropped = columns.into_iter().map(|c| c.name).collect();
        Projection {
            table: RawTable::from_parts(selected, height),
            defaulted,
            dropped,
        }
    }

    /// Convert a projected, fully imputed table into a feature batch.
    ///
    /// A cell that is still not a number after imputation is parsed, or set
    /// to 0 when it cannot be. Returns the batch and the number of such
    /// fallbacks.
    pub fn extract_batch(&self, table: &RawTable) -> Result<(FeatureBatch, usize)> {
        let mut fallbacks = 0;
        let mut to_value = |cell: &Cell| match cell {
            Cell::Number(v) => *v,
            other => other.to_number().unwrap_or_else(|| {
                fallbacks += 1;
                0.0
            }),
        };

        let features: Vec<&Column> = table.columns().iter().filter(|c| c.name != CHURN).collect();
        let names: Vec<String> = features.iter().map(|c| c.name.clone()).collect();

        let mut rows = Vec::with_capacity(table.height());
        for row in 0..table.height() {
            rows.push(features.iter().map(|c| to_value(&c.cells[row])).collect());
        }

        let labels = table.column(CHURN).map(|column| {
            column
                .cells
                .iter()
                .map(|cell| u8::from(cell.as_number() == Some(1.0)))
                .collect()
        });

        if fallbacks > 0 {
            warn!("{} non-numeric feature cells defaulted to 0", fallbacks);
        }
        Ok((FeatureBatch::new(names, rows, labels)?, fallbacks))
    }
}
