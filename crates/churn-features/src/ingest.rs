//! Input loading: CSV files via polars and JSON records via serde_json.
//!
//! The only fatal pipeline error lives here: input that cannot be turned
//! into a [`RawTable`] at all.

use crate::error::{FeatureError, Result, ResultExt};
use crate::types::{Cell, Column, RawTable};
use crate::utils::{is_boolean_dtype, is_numeric_dtype};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load a table from a `.json` file (object or array of objects) or a CSV
/// file with a header row. Any other extension is read as CSV.
pub fn load_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let content = std::fs::read_to_string(path)
            .map_err(FeatureError::Io)
            .context(format!("Reading {}", path.display()))?;
        if content.trim().is_empty() {
            return Err(FeatureError::MalformedInput(format!(
                "{} is empty",
                path.display()
            )));
        }
        return RawTable::from_json_str(&content).context(format!("Parsing {}", path.display()));
    }

    load_csv(path)
}

/// Load a CSV file, trying progressively more lenient strategies.
pub fn load_csv(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .map_err(FeatureError::Io)
        .context(format!("Opening {}", path.display()))?;
    if metadata.len() == 0 {
        return Err(FeatureError::MalformedInput(format!(
            "{} is empty",
            path.display()
        )));
    }

    info!("Loading CSV from {}", path.display());
    let df = load_csv_with_fallbacks(path)?;
    dataframe_to_table(&df).context(format!("Reading {}", path.display()))
}

/// Parse CSV content held in memory.
pub fn read_csv_str(content: &str) -> Result<RawTable> {
    if content.trim().is_empty() {
        return Err(FeatureError::MalformedInput("CSV input is empty".to_string()));
    }
    let df = csv_options(false)
        .into_reader_with_file_handle(Cursor::new(content.to_owned()))
        .finish()
        .map_err(|e| FeatureError::MalformedInput(e.to_string()))?;
    dataframe_to_table(&df)
}

/// Header row, schema inference over the first 100 rows, `"` quoting.
/// `truncate_ragged` drops fields beyond the header width instead of failing.
fn csv_options(truncate_ragged: bool) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(truncate_ragged),
        )
}

fn load_csv_with_fallbacks(path: &Path) -> Result<DataFrame> {
    match csv_options(false)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Rows wider than the header lose their trailing fields
    let df = csv_options(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| FeatureError::MalformedInput(format!("{}: {}", path.display(), e)))?;
    warn!("{} has rows wider than its header; extra fields were dropped", path.display());
    Ok(df)
}

/// Convert a polars DataFrame into a raw table of cells.
///
/// Numeric columns become number cells, boolean columns bool cells and
/// everything else text cells; nulls and blank strings become missing.
pub fn dataframe_to_table(df: &DataFrame) -> Result<RawTable> {
    if df.width() == 0 {
        return Err(FeatureError::MalformedInput("input has no columns".to_string()));
    }
    if df.height() == 0 {
        return Err(FeatureError::MalformedInput("input has no data rows".to_string()));
    }

    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let dtype = series.dtype();
        let cells: Vec<Cell> = if is_numeric_dtype(dtype) {
            let casted = series
                .cast(&DataType::Float64)
                .context(format!("Casting column '{}' to numbers", series.name()))?;
            casted
                .f64()?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::number))
                .collect()
        } else if is_boolean_dtype(dtype) {
            series
                .bool()?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::Bool))
                .collect()
        } else {
            let casted = series
                .cast(&DataType::String)
                .context(format!("Casting column '{}' to text", series.name()))?;
            casted
                .str()?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::text))
                .collect()
        };
        debug!("Loaded column '{}' as {:?}", series.name(), dtype);
        columns.push(Column::new(series.name().to_string(), cells));
    }

    RawTable::new(columns)
}
