use std::collections::HashMap;

use crate::{
    error::{NormalizeError, Result},
    table::NormalizedTable,
};

fn candidates<'t>(
    table: &'t NormalizedTable,
    keyword: &str,
    exclude: Option<&str>,
) -> (String, impl Iterator<Item = (usize, &'t str)> + 't) {
    let keyword = keyword.trim().to_uppercase();
    let exclude = exclude
        .map(|e| e.trim().to_uppercase())
        .filter(|e| !e.is_empty());
    let kw = keyword.clone();
    let iter = table
        .columns()
        .iter()
        .enumerate()
        .filter(move |(_, label)| {
            label.contains(kw.as_str())
                && exclude
                    .as_deref()
                    .map_or(true, |ex| !label.contains(ex))
        })
        .map(|(i, label)| (i, label.as_str()));
    (keyword, iter)
}

fn not_found(table: &NormalizedTable, keyword: String) -> NormalizeError {
    NormalizeError::ColumnNotFound {
        keyword,
        available: table.columns().to_vec(),
    }
}

/// First label, in column order, containing `keyword` and not containing
/// `exclude`.
pub fn resolve_column<'t>(
    table: &'t NormalizedTable,
    keyword: &str,
    exclude: Option<&str>,
) -> Result<&'t str> {
    let (keyword, mut found) = candidates(table, keyword, exclude);
    match found.next() {
        Some((_, label)) => Ok(label),
        None => Err(not_found(table, keyword)),
    }
}

/// Like [`resolve_column`], but a keyword matching several labels is an error.
pub fn resolve_column_strict<'t>(
    table: &'t NormalizedTable,
    keyword: &str,
    exclude: Option<&str>,
) -> Result<&'t str> {
    let (keyword, found) = candidates(table, keyword, exclude);
    let found: Vec<(usize, &str)> = found.collect();
    match found.as_slice() {
        [] => Err(not_found(table, keyword)),
        [(_, label)] => Ok(*label),
        many => Err(NormalizeError::AmbiguousColumn {
            label: keyword,
            positions: many.iter().map(|(i, _)| *i).collect(),
        }),
    }
}

/// Tries each spelling in turn (`ACCION`, then `ACCIÓN`); the first one that
/// resolves wins.
pub fn resolve_any<'t, S: AsRef<str>>(
    table: &'t NormalizedTable,
    keywords: &[S],
    exclude: Option<&str>,
) -> Result<&'t str> {
    for kw in keywords {
        if let Ok(label) = resolve_column(table, kw.as_ref(), exclude) {
            return Ok(label);
        }
    }
    let joined = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_uppercase())
        .collect::<Vec<_>>()
        .join(" | ");
    Err(not_found(table, joined))
}

/// Keyword → matching labels for one table. Rebuilt whenever needed, never
/// stored apart from the table it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    entries: HashMap<String, Vec<String>>,
}

impl ColumnIndex {
    pub fn build<S: AsRef<str>>(table: &NormalizedTable, keywords: &[S]) -> Self {
        let entries = keywords
            .iter()
            .map(|kw| {
                let (key, found) = candidates(table, kw.as_ref(), None);
                (key, found.map(|(_, l)| l.to_string()).collect::<Vec<_>>())
            })
            .collect();
        Self { entries }
    }

    /// Matching labels in column order; empty for unmatched or unknown keywords.
    pub fn labels(&self, keyword: &str) -> &[String] {
        self.entries
            .get(&keyword.trim().to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn first(&self, keyword: &str) -> Option<&str> {
        self.labels(keyword).first().map(String::as_str)
    }

    /// Keywords that matched nothing, sorted.
    pub fn unresolved(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, labels)| labels.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        missing.sort_unstable();
        missing
    }
}
