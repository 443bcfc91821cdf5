use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::{
    error::{NormalizeError, Result},
    table::NormalizedTable,
};

/// One group of [`aggregate_counts`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    /// Values of the grouping columns, in the order they were given.
    pub key: Vec<String>,
    pub count: usize,
    /// Sum of the numeric column, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    /// Non-empty cells of the numeric column that did not parse and were
    /// counted as zero.
    pub invalid: usize,
}

/// One distinct value of [`value_counts`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// Fraction of all counted rows, `0.0..=1.0`.
    pub share: f64,
}

/// Parse a cell as a number: trimmed, decimal comma accepted.
/// `None` for empty cells, `Some(Err(()))` for text that is not a number.
///
/// A comma is only read as a decimal point when it is the sole separator and
/// is not followed by exactly three digits; `1,000` could be a thousands
/// group and is rejected rather than summed as `1`.
fn parse_number(raw: &str) -> Option<std::result::Result<f64, ()>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = s
        .parse::<f64>()
        .ok()
        .or_else(|| decimal_comma(s))
        .filter(|f| f.is_finite());
    Some(parsed.ok_or(()))
}

fn decimal_comma(s: &str) -> Option<f64> {
    let (int, frac) = s.split_once(',')?;
    if frac.contains(',') || s.contains('.') {
        return None;
    }
    if frac.len() == 3 && frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("{}.{}", int, frac).parse().ok()
}

/// Count rows per distinct combination of `group_by` values, in
/// first-occurrence order, optionally summing `sum_column`.
///
/// Non-numeric and empty cells of `sum_column` count as zero; the
/// non-numeric ones are tallied in [`GroupCount::invalid`].
pub fn aggregate_counts<S: AsRef<str>>(
    table: &NormalizedTable,
    group_by: &[S],
    sum_column: Option<&str>,
) -> Result<Vec<GroupCount>> {
    if group_by.is_empty() {
        return Err(NormalizeError::InvalidGrouping);
    }
    let positions = group_by
        .iter()
        .map(|label| table.column_position(label.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let sum_pos = sum_column
        .map(|label| table.column_position(label))
        .transpose()?;
    table.ensure_has_data()?;

    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut groups: Vec<GroupCount> = Vec::new();
    for record in table.raw_rows() {
        let key: Vec<&str> = positions.iter().map(|&p| record[p].as_str()).collect();
        let slot = *index.entry(key).or_insert_with_key(|key| {
            groups.push(GroupCount {
                key: key.iter().map(|s| s.to_string()).collect(),
                count: 0,
                sum: sum_pos.map(|_| 0.0),
                invalid: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.count += 1;
        if let Some(p) = sum_pos {
            match parse_number(&record[p]) {
                Some(Ok(n)) => *group.sum.get_or_insert(0.0) += n,
                Some(Err(())) => group.invalid += 1,
                None => {}
            }
        }
    }

    let invalid: usize = groups.iter().map(|g| g.invalid).sum();
    if invalid > 0 {
        warn!(
            column = sum_column.unwrap_or_default(),
            invalid, "non-numeric values counted as zero"
        );
    }
    Ok(groups)
}

/// Occurrences of each value of `label`, most frequent first; ties keep
/// first-occurrence order.
pub fn value_counts(table: &NormalizedTable, label: &str) -> Result<Vec<ValueCount>> {
    let groups = aggregate_counts(table, &[label], None)?;
    let total: usize = groups.iter().map(|g| g.count).sum();

    let mut counts: Vec<ValueCount> = groups
        .into_iter()
        .map(|g| ValueCount {
            value: g.key.into_iter().next().unwrap_or_default(),
            count: g.count,
            share: if total == 0 {
                0.0
            } else {
                g.count as f64 / total as f64
            },
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}
