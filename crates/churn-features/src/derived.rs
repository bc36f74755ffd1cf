//! Derived features: senior citizen from age, the combined phone/internet
//! indicator and the online/streaming aggregates.
//!
//! Derivations are pure functions of already-coerced columns and run after
//! pass-1 imputation and the row stages.

use crate::config::FeatureContract;
use crate::error::Result;
use crate::schema::{AGE, INTERNET_SERVICE, ONLINE_SERVICE, PHONE_SERVICE, SENIOR_CITIZEN, STREAMING};
use crate::types::{Cell, Column, RawTable};
use tracing::{debug, info};

/// Whether a cell counts as an enabled flag.
///
/// True for `Number(1)`, `Bool(true)` and the contract's truthy spellings
/// (case-insensitive, trimmed).
pub fn is_truthy(cell: &Cell, contract: &FeatureContract) -> bool {
    match cell {
        Cell::Number(v) => *v == 1.0,
        Cell::Bool(b) => *b,
        Cell::Text(s) => contract.truthy_values.contains(&s.trim().to_lowercase()),
        Cell::Missing => false,
    }
}

fn flag(value: bool) -> Cell {
    Cell::Number(if value { 1.0 } else { 0.0 })
}

/// Builds the derived model features in place.
pub struct DerivedFeatureBuilder;

impl DerivedFeatureBuilder {
    /// Apply every derivation. Returns the names of the features that were
    /// computed (rather than kept or defaulted).
    pub fn derive(&self, table: &mut RawTable, contract: &FeatureContract) -> Result<Vec<String>> {
        let mut derived = Vec::new();

        if self.derive_senior_citizen(table, contract)? {
            derived.push(SENIOR_CITIZEN.to_string());
        }
        if self.combine_phone_internet(table, contract)? {
            derived.push(PHONE_SERVICE.to_string());
        }
        if self.derive_any(table, contract, ONLINE_SERVICE, &contract.online_sources)? {
            derived.push(ONLINE_SERVICE.to_string());
        }
        if self.derive_any(table, contract, STREAMING, &contract.streaming_sources)? {
            derived.push(STREAMING.to_string());
        }

        info!("Derived features: {:?}", derived);
        Ok(derived)
    }

    /// `seniorcitizen = age >= threshold` when age is present and
    /// seniorcitizen is not; age is then removed.
    fn derive_senior_citizen(&self, table: &mut RawTable, contract: &FeatureContract) -> Result<bool> {
        if table.contains(SENIOR_CITIZEN) {
            return Ok(false);
        }
        let Some(age) = table.remove_column(AGE) else {
            return Ok(false);
        };

        let cells = age
            .cells
            .iter()
            .map(|cell| flag(cell.to_number().is_some_and(|a| a >= contract.senior_age_threshold)))
            .collect();
        table.set_column(Column::new(SENIOR_CITIZEN, cells))?;
        debug!("Derived '{}' from '{}'", SENIOR_CITIZEN, AGE);
        Ok(true)
    }

    /// Ternary phone indicator: 2 when both phone and internet are on, 1 when
    /// exactly one is, 0 when neither.
    ///
    /// Without an internet column an existing phone column is kept as is; with
    /// neither column the indicator is 0.
    fn combine_phone_internet(&self, table: &mut RawTable, contract: &FeatureContract) -> Result<bool> {
        let height = table.height();
        let Some(internet) = table.column(INTERNET_SERVICE) else {
            if !table.contains(PHONE_SERVICE) {
                table.set_column(Column::constant(PHONE_SERVICE, 0.0, height))?;
            }
            return Ok(false);
        };

        let phone = table.column(PHONE_SERVICE);
        let cells = (0..height)
            .map(|row| {
                let has_phone = phone.is_some_and(|c| is_truthy(&c.cells[row], contract));
                let has_internet = is_truthy(&internet.cells[row], contract);
                Cell::Number(f64::from(u8::from(has_phone) + u8::from(has_internet)))
            })
            .collect();
        table.set_column(Column::new(PHONE_SERVICE, cells))?;
        debug!("Combined '{}' with '{}'", PHONE_SERVICE, INTERNET_SERVICE);
        Ok(true)
    }

    /// Logical OR over whichever `sources` are present.
    ///
    /// With no source present an existing `target` column is kept (parsed to
    /// numbers); otherwise the feature is constant 0.
    fn derive_any(
        &self,
        table: &mut RawTable,
        contract: &FeatureContract,
        target: &str,
        sources: &[String],
    ) -> Result<bool> {
        let present: Vec<&Column> = sources.iter().filter_map(|s| table.column(s)).collect();

        if present.is_empty() {
            let column = match table.column(target) {
                Some(existing) => Column::new(
                    target,
                    existing
                        .cells
                        .iter()
                        .map(|c| c.to_number().map_or(Cell::Missing, Cell::Number))
                        .collect(),
                ),
                None => Column::constant(target, 0.0, table.height()),
            };
            table.set_column(column)?;
            return Ok(false);
        }

        let cells = (0..table.height())
            .map(|row| flag(present.iter().any(|c| is_truthy(&c.cells[row], contract))))
            .collect();
        debug!("Derived '{}' from {} source columns", target, present.len());
        table.set_column(Column::new(target, cells))?;
        Ok(true)
    }
}
