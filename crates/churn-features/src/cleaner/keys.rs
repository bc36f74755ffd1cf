use crate::types::{Column, RawTable};
use crate::utils::alphanumeric_key;
use tracing::debug;

/// Canonical key form of a column label: lower-case ASCII alphanumerics.
pub fn normalize_key(label: &str) -> String {
    alphanumeric_key(label)
}

/// Rewrites every column label to its key form.
pub struct KeyNormalizer;

impl KeyNormalizer {
    /// Normalize all labels of `table`.
    ///
    /// Labels that collide after normalization resolve last-declared-wins:
    /// the later column's cells replace the earlier ones, and the column keeps
    /// the position of its first occurrence. Returns the collided keys.
    pub fn normalize_table(&self, table: RawTable) -> (RawTable, Vec<String>) {
        let height = table.height();
        let mut columns: Vec<Column> = Vec::with_capacity(table.width());
        let mut collisions = Vec::new();

        for column in table.into_columns() {
            let key = normalize_key(&column.name);
            if let Some(existing) = columns.iter_mut().find(|c| c.name == key) {
                debug!("Column '{}' collides with key '{}', later column wins", column.name, key);
                existing.cells = column.cells;
                collisions.push(key);
            } else {
                columns.push(Column::new(key, column.cells));
            }
        }

        (RawTable::from_parts(columns, height), collisions)
    }
}
