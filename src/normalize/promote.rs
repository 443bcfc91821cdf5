use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::clean::{clean_cell, is_placeholder_label, normalize_label};
use crate::{
    error::{NormalizeError, Result},
    grid::RawGrid,
    table::NormalizedTable,
};

/// What to do when two surviving columns normalize to the same label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Reject the sheet with `AmbiguousColumn`.
    #[default]
    Fail,
    /// Keep the first as is, rename the rest `LABEL_2`, `LABEL_3`, ...
    Suffix,
}

/// Turn row `row_index` into column labels and everything below it into data.
///
/// Placeholder-labeled columns, fully empty rows and fully empty columns are
/// dropped. Empty columns are only dropped when some data row survives, so a
/// header-only sheet keeps its labels.
pub fn promote_header(
    grid: &RawGrid,
    row_index: usize,
    duplicates: DuplicatePolicy,
) -> Result<NormalizedTable> {
    if row_index >= grid.len() {
        debug!(row_index, rows = grid.len(), "header row past end of grid");
        return Ok(NormalizedTable::new(Vec::new(), Vec::new()));
    }

    // 1) labels, skipping placeholders
    let mut kept: Vec<(usize, String)> = (0..grid.width())
        .map(|col| (col, normalize_label(&grid.cell(row_index, col).to_text())))
        .filter(|(_, label)| !is_placeholder_label(label))
        .collect();

    // 2) data rows over the kept columns, blank rows dropped
    let mut rows: Vec<Vec<String>> = (row_index + 1..grid.len())
        .map(|r| {
            kept.iter()
                .map(|(col, _)| clean_cell(&grid.cell(r, *col).to_text()))
                .collect::<Vec<_>>()
        })
        .filter(|values| values.iter().any(|v| !v.is_empty()))
        .collect();
    let blank_rows = grid.len() - row_index - 1 - rows.len();

    // 3) blank columns, only once there is data to judge them by
    let mut blank_cols = 0;
    if !rows.is_empty() {
        let filled: Vec<bool> = (0..kept.len())
            .map(|i| rows.iter().any(|r| !r[i].is_empty()))
            .collect();
        blank_cols = filled.iter().filter(|f| !**f).count();
        if blank_cols > 0 {
            let mut keep_iter = filled.iter();
            kept.retain(|_| *keep_iter.next().unwrap_or(&false));
            for row in &mut rows {
                let mut keep_iter = filled.iter();
                row.retain(|_| *keep_iter.next().unwrap_or(&false));
            }
        }
    }

    debug!(
        row_index,
        columns = kept.len(),
        rows = rows.len(),
        blank_rows,
        blank_cols,
        "promoted header"
    );

    // 4) duplicate labels
    let columns = resolve_duplicates(kept, duplicates)?;
    Ok(NormalizedTable::new(columns, rows))
}

fn resolve_duplicates(kept: Vec<(usize, String)>, policy: DuplicatePolicy) -> Result<Vec<String>> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (col, label) in &kept {
        positions.entry(label.as_str()).or_default().push(*col);
    }

    let first_duplicate = kept.iter().find_map(|(_, l)| {
        positions
            .get(l.as_str())
            .filter(|p| p.len() > 1)
            .map(|p| (l.clone(), p.clone()))
    });
    let Some((label, cols)) = first_duplicate else {
        return Ok(kept.into_iter().map(|(_, l)| l).collect());
    };
    if policy == DuplicatePolicy::Fail {
        return Err(NormalizeError::AmbiguousColumn {
            label,
            positions: cols,
        });
    }

    let mut taken: HashSet<String> = kept.iter().map(|(_, l)| l.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(kept.len());
    for (_, label) in kept {
        if seen.insert(label.clone()) {
            out.push(label);
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{}_{}", label, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        debug!(from = %label, to = %renamed, "renamed duplicate column");
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    Ok(out)
}
