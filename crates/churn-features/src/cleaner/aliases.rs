use super::keys::normalize_key;
use crate::config::FeatureContract;
use crate::schema::TENURE;
use crate::types::{AliasRename, Cell, Column, RawTable};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of alias resolution.
#[derive(Debug, Clone, Default)]
pub struct AliasResolution {
    pub renames: Vec<AliasRename>,
    /// Unclaimed columns that aliased an already claimed canonical name.
    pub shadowed: Vec<String>,
}

/// Greedy first-match mapping of column keys onto canonical names.
pub struct AliasResolver;

impl AliasResolver {
    /// Resolve aliases in alias-table declaration order.
    ///
    /// Each canonical name claims the first unclaimed column in table order
    /// whose key is one of its normalized variants. A claimed column is never
    /// reconsidered. Other unclaimed columns aliasing the same canonical name
    /// are removed so only the first one survives.
    pub fn resolve(&self, table: RawTable, contract: &FeatureContract) -> (RawTable, AliasResolution) {
        let height = table.height();
        let mut columns = table.into_columns();
        let mut claimed = vec![false; columns.len()];
        let mut removed = vec![false; columns.len()];
        let mut resolution = AliasResolution::default();

        for entry in &contract.aliases {
            let variants: HashSet<String> =
                entry.variants.iter().map(|v| normalize_key(v)).collect();

            let is_candidate = |idx: usize, column: &Column| {
                !claimed[idx] && !removed[idx] && variants.contains(&column.name)
            };

            let Some(idx) = columns
                .iter()
                .enumerate()
                .position(|(idx, column)| is_candidate(idx, column))
            else {
                continue;
            };

            let shadowed: Vec<usize> = columns
                .iter()
                .enumerate()
                .skip(idx + 1)
                .filter(|(i, column)| is_candidate(*i, *column))
                .map(|(i, _)| i)
                .collect();

            claimed[idx] = true;
            for i in shadowed {
                debug!(
                    "Column '{}' also aliases '{}', keeping '{}'",
                    columns[i].name, entry.canonical, columns[idx].name
                );
                removed[i] = true;
                resolution.shadowed.push(columns[i].name.clone());
            }

            let column = &mut columns[idx];
            let raw_key = std::mem::replace(&mut column.name, entry.canonical.clone());
            let converted_units = entry.canonical == TENURE && raw_key.contains("year");
            if converted_units {
                column.cells = column
                    .cells
                    .iter()
                    .map(|cell| match cell.to_number() {
                        Some(years) => Cell::Number(years * contract.months_per_year),
                        None => Cell::Missing,
                    })
                    .collect();
            }

            if raw_key != entry.canonical || converted_units {
                debug!("Renamed '{}' to '{}'", raw_key, entry.canonical);
                resolution.renames.push(AliasRename {
                    raw_key,
                    canonical: entry.canonical.clone(),
                    converted_units,
                });
            }
        }

        let columns = columns
            .into_iter()
            .zip(removed)
            .filter_map(|(column, removed)| (!removed).then_some(column))
            .collect();

        (RawTable::from_parts(columns, height), resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::KeyNormalizer;
    use pretty_assertions::assert_eq;

    fn normalized(columns: Vec<Column>) -> RawTable {
        KeyNormalizer
            .normalize_table(RawTable::new(columns).unwrap())
            .0
    }

    #[test]
    fn test_every_variant_resolves_in_any_case() {
        let contract = FeatureContract::default();
        for entry in &contract.aliases {
            for variant in &entry.variants {
                for label in [variant.to_uppercase(), format!(" {}-", variant), variant.clone()] {
                    let table = normalized(vec![Column::new(label.clone(), vec![Cell::Number(1.0)])]);
                    let (table, _) = AliasResolver.resolve(table, &contract);
                    assert_eq!(
                        table.names(),
                        vec![entry.canonical.as_str()],
                        "label '{label}' should resolve to '{}'",
                        entry.canonical
                    );
                }
            }
        }
    }

    #[test]
    fn test_first_in_table_order_wins() {
        let contract = FeatureContract::default();
        let table = normalized(vec![
            Column::new("Sex", vec![Cell::text("Male")]),
            Column::new("Gender", vec![Cell::text("Female")]),
        ]);

        let (table, resolution) = AliasResolver.resolve(table, &contract);
        assert_eq!(table.names(), vec!["gender"]);
        assert_eq!(table.column("gender").unwrap().cells, vec![Cell::text("Male")]);
        assert_eq!(resolution.shadowed, vec!["gender".to_string()]);
    }

    #[test]
    fn test_tenure_in_years_converted_to_months() {
        let contract = FeatureContract::default();
        let table = normalized(vec![Column::new(
            "TenureInYears",
            vec![Cell::Number(2.0), Cell::text("1.5"), Cell::text("n/a")],
        )]);

        let (table, resolution) = AliasResolver.resolve(table, &contract);
        assert_eq!(
            table.column("tenure").unwrap().cells,
            vec![Cell::Number(24.0), Cell::Number(18.0), Cell::Missing]
        );
        assert_eq!(
            resolution.renames,
            vec![AliasRename {
                raw_key: "tenureinyears".to_string(),
                canonical: "tenure".to_string(),
                converted_units: true,
            }]
        );
    }

    #[test]
    fn test_tenure_in_months_not_converted() {
        let contract = FeatureContract::default();
        let table = normalized(vec![Column::new("Tenure_In_Months", vec![Cell::Number(7.0)])]);

        let (table, _) = AliasResolver.resolve(table, &contract);
        assert_eq!(table.column("tenure").unwrap().cells, vec![Cell::Number(7.0)]);
    }

    #[test]
    fn test_unmatched_columns_left_untouched() {
        let contract = FeatureContract::default();
        let table = normalized(vec![
            Column::new("customerID", vec![Cell::text("A-1")]),
            Column::new("Region", vec![Cell::text("North")]),
        ]);

        let (table, resolution) = AliasResolver.resolve(table, &contract);
        assert_eq!(table.names(), vec!["customerid", "region"]);
        assert!(resolution.renames.is_empty());
    }

    #[test]
    fn test_canonical_names_are_not_reported_as_renames() {
        let contract = FeatureContract::default();
        let table = normalized(vec![Column::new("gender", vec![Cell::Number(0.0)])]);

        let (_, resolution) = AliasResolver.resolve(table, &contract);
        assert!(resolution.renames.is_empty());
    }
}
