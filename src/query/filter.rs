use std::collections::HashSet;

use crate::{error::Result, normalize::clean::is_blank_value, table::NormalizedTable};

/// Distinct values of `label` in first-occurrence order. With
/// `exclude_blanks`, empty cells and `nan`/`none` leftovers are skipped.
pub fn unique_values(
    table: &NormalizedTable,
    label: &str,
    exclude_blanks: bool,
) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in table.column_values(label)? {
        if exclude_blanks && is_blank_value(value) {
            continue;
        }
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    Ok(out)
}

/// The same set as [`unique_values`], sorted; what a selection list shows.
pub fn sorted_unique_values(
    table: &NormalizedTable,
    label: &str,
    exclude_blanks: bool,
) -> Result<Vec<String>> {
    let mut values = unique_values(table, label, exclude_blanks)?;
    values.sort();
    Ok(values)
}

/// Rows whose `label` value equals `value` exactly, in their original order.
/// Matching nothing is an empty table, not an error.
pub fn filter_rows(table: &NormalizedTable, label: &str, value: &str) -> Result<NormalizedTable> {
    let pos = table.column_position(label)?;
    let rows = table
        .raw_rows()
        .iter()
        .filter(|r| r[pos] == value)
        .cloned()
        .collect();
    Ok(table.derive(rows))
}
