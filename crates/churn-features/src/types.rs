//! Core data types: cells, raw tables, feature batches and pipeline summaries.

use crate::error::{FeatureError, Result};
use crate::utils::{format_number, parse_numeric_string};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Cells and raw tables
// =============================================================================

/// A single untyped input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Build a text cell; blank text is missing.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(value)
        }
    }

    /// Build a number cell; non-finite values are missing.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Missing
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// The value if this is already a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric interpretation: numbers as-is, booleans as 1/0, text parsed.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => parse_numeric_string(s),
            Cell::Missing => None,
        }
    }

    /// Textual rendering of the cell, `None` when missing.
    pub fn render(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number(v) => Some(format_number(*v)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Convert a JSON scalar into a cell. Nested values are kept as their
    /// JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Missing,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Cell::Missing, Cell::number),
            Value::String(s) => Cell::text(s.as_str()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// A labelled column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Column of `len` copies of a number.
    pub fn constant(name: impl Into<String>, value: f64, len: usize) -> Self {
        Self::new(name, vec![Cell::Number(value); len])
    }

    /// True when every non-missing cell is a number. An all-missing column
    /// counts as numeric.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, Cell::Missing | Cell::Number(_)))
    }

    /// True when the column holds at least one text or boolean cell.
    pub fn has_textual(&self) -> bool {
        self.cells
            .iter()
            .any(|c| matches!(c, Cell::Text(_) | Cell::Bool(_)))
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    /// Non-missing numeric values in row order.
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_number).collect()
    }
}

/// Ordered columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<Column>,
    height: usize,
}

impl RawTable {
    /// Build a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, |c| c.cells.len());
        if let Some(bad) = columns.iter().find(|c| c.cells.len() != height) {
            return Err(FeatureError::RaggedColumn {
                column: bad.name.clone(),
                expected: height,
                actual: bad.cells.len(),
            });
        }
        Ok(Self { columns, height })
    }

    /// Parse a JSON object (one record) or an array of objects.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Self::from_json_value(&value)
    }

    /// Build a table from a JSON object (one row) or an array of objects.
    ///
    /// Columns appear in first-seen key order; keys missing from a record are
    /// missing cells.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        let records: Vec<&serde_json::Map<String, Value>> = match value {
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().ok_or_else(|| {
                        FeatureError::MalformedInput(format!(
                            "record {i} is not a JSON object"
                        ))
                    })
                })
                .collect::<Result<_>>()?,
            _ => {
                return Err(FeatureError::MalformedInput(
                    "expected a JSON object or an array of objects".to_string(),
                ));
            }
        };

        if records.is_empty() {
            return Err(FeatureError::MalformedInput(
                "JSON array contains no records".to_string(),
            ));
        }

        let mut columns: Vec<Column> = Vec::new();
        for (row, record) in records.iter().enumerate() {
            for (key, value) in record.iter() {
                let idx = match columns.iter().position(|c| &c.name == key) {
                    Some(idx) => idx,
                    None => {
                        columns.push(Column::new(key.clone(), vec![Cell::Missing; records.len()]));
                        columns.len() - 1
                    }
                };
                columns[idx].cells[row] = Cell::from_json(value);
            }
        }

        if columns.is_empty() {
            return Err(FeatureError::MalformedInput(
                "JSON records have no fields".to_string(),
            ));
        }

        Self::new(columns)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        self.position(name).map(|idx| self.columns.remove(idx))
    }

    /// Replace the cells of an existing column, or append a new one.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.cells.len() != self.height {
            return Err(FeatureError::RaggedColumn {
                column: column.name,
                expected: self.height,
                actual: column.cells.len(),
            });
        }
        match self.position(&column.name) {
            Some(idx) => self.columns[idx].cells = column.cells,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// New table with the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> RawTable {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.cells[i].clone()).collect()))
            .collect();
        RawTable::from_parts(columns, indices.len())
    }

    /// Assemble a table from columns already known to have `height` rows.
    pub(crate) fn from_parts(columns: Vec<Column>, height: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.cells.len() == height));
        Self { columns, height }
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

/// A raw column label rewritten to a canonical feature name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRename {
    pub raw_key: String,
    pub canonical: String,
    /// True when the values were converted from years to months.
    pub converted_units: bool,
}

/// Result of a row-count-changing stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RowStageOutcome {
    pub table: RawTable,
    pub dropped: usize,
}

// =============================================================================
// Feature vectors
// =============================================================================

/// One row of the model schema. Values are never missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(names: Arc<[String]>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(FeatureError::MalformedInput(format!(
                "feature vector has {} values for {} names",
                values.len(),
                names.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Ordered feature rows plus optional churn labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    names: Arc<[String]>,
    rows: Vec<FeatureVector>,
    labels: Option<Vec<u8>>,
}

impl FeatureBatch {
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>, labels: Option<Vec<u8>>) -> Result<Self> {
        let names: Arc<[String]> = names.into();
        if let Some(labels) = &labels {
            if labels.len() != rows.len() {
                return Err(FeatureError::MalformedInput(format!(
                    "{} labels for {} rows",
                    labels.len(),
                    rows.len()
                )));
            }
        }
        let rows = rows
            .into_iter()
            .map(|values| FeatureVector::new(Arc::clone(&names), values))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names, rows, labels })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn labels(&self) -> Option<&[u8]> {
        self.labels.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one feature, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Back to a raw table of number cells, label column included.
    pub fn to_raw_table(&self) -> RawTable {
        let mut columns: Vec<Column> = self
            .names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                Column::new(
                    name.clone(),
                    self.rows.iter().map(|r| Cell::Number(r.values[idx])).collect(),
                )
            })
            .collect();
        if let Some(labels) = &self.labels {
            columns.push(Column::new(
                crate::schema::CHURN,
                labels.iter().map(|&l| Cell::Number(f64::from(l))).collect(),
            ));
        }
        RawTable::from_parts(columns, self.rows.len())
    }

    /// Convert to a polars DataFrame: one Float64 column per feature and an
    /// Int32 `churn` column when labelled.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.names.len() + 1);
        for name in self.names.iter() {
            let values = self.column(name).unwrap_or_default();
            columns.push(Series::new(name.as_str().into(), values).into_column());
        }
        if let Some(labels) = &self.labels {
            let values: Vec<i32> = labels.iter().map(|&l| i32::from(l)).collect();
            columns.push(Series::new(crate::schema::CHURN.into(), values).into_column());
        }
        Ok(DataFrame::new(columns)?)
    }
}

// =============================================================================
// Pipeline results
// =============================================================================

/// Counters and decisions recorded while running the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows removed by churn-label cleaning.
    pub rows_dropped: usize,
    pub columns_before: usize,
    pub renames: Vec<AliasRename>,
    /// Input columns not part of the model schema.
    pub dropped_columns: Vec<String>,
    /// Model features absent from the input and filled with 0.
    pub defaulted_features: Vec<String>,
    /// Features derived rather than read from input.
    pub derived_features: Vec<String>,
    pub cells_imputed: usize,
    pub negatives_rejected: usize,
    /// Cells whose value could not be interpreted and took a default.
    pub ambiguous_values: usize,
    pub sorted_by_id: bool,
    pub labeled: bool,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

impl PipelineSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn rows_dropped_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_dropped as f32 / self.rows_before as f32) * 100.0
        }
    }
}

/// Output of [`Pipeline::process`](crate::Pipeline::process).
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub batch: FeatureBatch,
    pub summary: PipelineSummary,
}
