use crate::config::FeatureContract;
use crate::schema::{CHURN, CONTRACT, GENDER, TOTAL_CHARGES};
use crate::types::{Cell, Column, RawTable};
use crate::utils::{alphanumeric_key, collapse_spaces, numeric_mode, parse_numeric_string};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Counters collected while coercing values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    /// Columns mapped by the yes/no rule.
    pub yes_no_columns: Vec<String>,
    /// Columns mapped by the rejection-keyword test.
    pub keyword_columns: Vec<String>,
    /// Cells that could not be interpreted and became missing.
    pub ambiguous: usize,
    /// Contract cells filled with the column mode (or 0).
    pub contract_filled: usize,
}

/// Converts heterogeneous cell representations into normalized values.
///
/// Every rule is total: unrecognized values become missing or take the
/// documented default, never an error.
pub struct ValueCoercer;

impl ValueCoercer {
    pub fn coerce(&self, mut table: RawTable, contract: &FeatureContract) -> (RawTable, CoercionReport) {
        let mut report = CoercionReport::default();

        for column in table.columns_mut() {
            if map_yes_no(column) {
                debug!("Mapped yes/no column '{}'", column.name);
                report.yes_no_columns.push(column.name.clone());
            }
        }

        if let Some(column) = table.column_mut(GENDER) {
            report.ambiguous += coerce_gender(column);
        }

        if let Some(column) = table.column_mut(CONTRACT) {
            let (ambiguous, filled) = coerce_contract(column, contract);
            report.ambiguous += ambiguous;
            report.contract_filled += filled;
        }

        for name in &contract.numeric_features {
            if let Some(column) = table.column_mut(name) {
                if parse_numeric_column(column) {
                    debug!("Parsed numeric text in '{}'", column.name);
                }
            }
        }

        for column in table.columns_mut() {
            if is_keyword_exempt(&column.name, contract) || !column.has_textual() {
                continue;
            }
            apply_rejection_keywords(column, contract);
            debug!("Applied rejection keywords to '{}'", column.name);
            report.keyword_columns.push(column.name.clone());
        }

        info!(
            "Coerced {} yes/no and {} keyword columns ({} ambiguous cells)",
            report.yes_no_columns.len(),
            report.keyword_columns.len(),
            report.ambiguous
        );

        (table, report)
    }
}

fn is_keyword_exempt(name: &str, contract: &FeatureContract) -> bool {
    name == GENDER
        || name == CONTRACT
        || name == TOTAL_CHARGES
        || name == CHURN
        || name == contract.id_column
}

fn lowered(cell: &Cell) -> Option<String> {
    cell.render().map(|s| s.trim().to_lowercase())
}

/// Map `yes -> 1`, `no -> 0` when the column's distinct values are a subset
/// of `{yes, no}`. Only columns with text or bool cells qualify.
fn map_yes_no(column: &mut Column) -> bool {
    if !column.has_textual() {
        return false;
    }
    let distinct: BTreeSet<String> = column.cells.iter().filter_map(lowered).collect();
    if distinct.is_empty() || !distinct.iter().all(|v| v == "yes" || v == "no") {
        return false;
    }
    for cell in &mut column.cells {
        if let Some(value) = lowered(cell) {
            *cell = Cell::Number(if value == "yes" { 1.0 } else { 0.0 });
        }
    }
    true
}

/// `male -> 0`, `female -> 1`; numeric 0/1 pass through; anything else is
/// missing. Returns the number of ambiguous cells.
fn coerce_gender(column: &mut Column) -> usize {
    let mut ambiguous = 0;
    for cell in &mut column.cells {
        let coerced = match &*cell {
            Cell::Missing => continue,
            Cell::Number(v) if *v == 0.0 || *v == 1.0 => continue,
            Cell::Text(s) => match s.trim().to_lowercase().as_str() {
                "male" => Cell::Number(0.0),
                "female" => Cell::Number(1.0),
                _ => Cell::Missing,
            },
            _ => Cell::Missing,
        };
        if coerced.is_missing() {
            debug!("Ambiguous gender value {:?}", cell);
            ambiguous += 1;
        }
        *cell = coerced;
    }
    ambiguous
}

/// Map contract spellings to codes, then fill gaps with the column mode.
///
/// An all-missing column becomes constant 0. Returns
/// `(ambiguous cells, filled cells)`.
fn coerce_contract(column: &mut Column, contract: &FeatureContract) -> (usize, usize) {
    let valid_codes: BTreeSet<u8> = contract.contract_codes.values().copied().collect();
    let is_code = |v: f64| v.fract() == 0.0 && (0.0..=255.0).contains(&v) && valid_codes.contains(&(v as u8));

    let mut ambiguous = 0;
    for cell in &mut column.cells {
        let coerced = match &*cell {
            Cell::Missing => continue,
            Cell::Number(v) if is_code(*v) => continue,
            Cell::Text(s) => match contract.contract_codes.get(&alphanumeric_key(s)) {
                Some(code) => Cell::Number(f64::from(*code)),
                None => match parse_numeric_string(s) {
                    Some(v) if is_code(v) => Cell::Number(v),
                    _ => Cell::Missing,
                },
            },
            _ => Cell::Missing,
        };
        if coerced.is_missing() {
            debug!("Unmapped contract value {:?}", cell);
            ambiguous += 1;
        }
        *cell = coerced;
    }

    let fill = numeric_mode(&column.numbers()).unwrap_or(0.0);
    let mut filled = 0;
    for cell in &mut column.cells {
        if cell.is_missing() {
            *cell = Cell::Number(fill);
            filled += 1;
        }
    }
    (ambiguous, filled)
}

/// Convert a numeric feature's text cells to numbers when every one of them
/// parses. A single unparseable value leaves the column textual, so it goes
/// through the rejection-keyword test like any other text column.
fn parse_numeric_column(column: &mut Column) -> bool {
    let parsed: Option<Vec<Cell>> = column
        .cells
        .iter()
        .map(|cell| match cell {
            Cell::Missing | Cell::Number(_) => Some(cell.clone()),
            other => other.to_number().map(Cell::Number),
        })
        .collect();
    match parsed {
        Some(cells) if column.has_textual() => {
            column.cells = cells;
            true
        }
        _ => false,
    }
}

/// Rejection-keyword test: a value collapsing to a rejection word is 0,
/// anything else present is 1. Missing cells stay missing.
fn apply_rejection_keywords(column: &mut Column, contract: &FeatureContract) {
    for cell in &mut column.cells {
        *cell = match &*cell {
            Cell::Missing => Cell::Missing,
            Cell::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            other => {
                let value = other.render().map(|s| collapse_spaces(&s)).unwrap_or_default();
                if contract.rejection_vocabulary.contains(&value) {
                    Cell::Number(0.0)
                } else {
                    Cell::Number(1.0)
                }
            }
        };
    }
}
