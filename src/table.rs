use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{
    error::{NormalizeError, Result},
    grid::{Cell, RawGrid},
};

/// Rows of text keyed by normalized, unique column labels.
///
/// Produced by [`crate::normalize::promote_header`] and never mutated after;
/// queries return new tables.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Data rows of the unfiltered table this one descends from.
    origin_rows: usize,
}

impl NormalizedTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let origin_rows = rows.len();
        Self {
            columns,
            rows,
            origin_rows,
        }
    }

    /// Same columns and origin, different rows. Used by filters.
    pub(crate) fn derive(&self, rows: Vec<Vec<String>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
            origin_rows: self.origin_rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn origin_rows(&self) -> usize {
        self.origin_rows
    }

    /// Fails with `EmptyTable` when the source had no data rows at all.
    /// A filtered-down table of a non-empty source passes.
    pub fn ensure_has_data(&self) -> Result<()> {
        if self.origin_rows == 0 {
            Err(NormalizeError::EmptyTable)
        } else {
            Ok(())
        }
    }

    /// Position of an exact label.
    pub fn column_position(&self, label: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| NormalizeError::ColumnNotFound {
                keyword: label.to_string(),
                available: self.columns.clone(),
            })
    }

    /// Every value of one column, in row order.
    pub fn column_values(&self, label: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let pos = self.column_position(label)?;
        Ok(self.rows.iter().map(move |r| r[pos].as_str()))
    }

    pub fn record(&self, idx: usize) -> Option<Record<'_>> {
        self.rows.get(idx).map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub(crate) fn raw_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Back to a grid with the labels as row 0.
    pub fn to_grid(&self) -> RawGrid {
        let header = self.columns.iter().map(|c| Cell::from(c.as_str()));
        let mut rows: Vec<Vec<Cell>> = vec![header.collect()];
        rows.extend(
            self.rows
                .iter()
                .map(|r| r.iter().map(|v| Cell::from(v.as_str())).collect()),
        );
        RawGrid::new(rows)
    }
}

/// One row seen as `label -> value`.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, label: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == label)
            .map(|i| self.values[i].as_str())
    }

    /// Pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Serialized as an array of objects whose keys keep column order.
impl Serialize for NormalizedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedTable {
        NormalizedTable::new(
            vec!["MENTOR".into(), "CRITICIDAD".into()],
            vec![
                vec!["Pedro".into(), "Alta".into()],
                vec!["Rosa".into(), "Baja".into()],
            ],
        )
    }

    #[test]
    fn records_map_labels_to_values() {
        let table = sample();
        let rec = table.record(1).expect("second row");
        assert_eq!(rec.get("MENTOR"), Some("Rosa"));
        assert_eq!(rec.get("mentor"), None);
        assert_eq!(
            rec.iter().collect::<Vec<_>>(),
            vec![("MENTOR", "Rosa"), ("CRITICIDAD", "Baja")]
        );
        assert!(table.record(2).is_none());
    }

    #[test]
    fn unknown_label_reports_available_columns() {
        let err = sample().column_position("RECURSO").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::ColumnNotFound {
                keyword: "RECURSO".into(),
                available: vec!["MENTOR".into(), "CRITICIDAD".into()],
            }
        );
    }

    #[test]
    fn derived_tables_keep_their_origin() {
        let table = sample();
        let empty = table.derive(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.origin_rows(), 2);
        assert!(empty.ensure_has_data().is_ok());

        let none = NormalizedTable::new(vec!["MENTOR".into()], Vec::new());
        assert_eq!(none.ensure_has_data(), Err(NormalizeError::EmptyTable));
    }

    #[test]
    fn serializes_as_ordered_records() -> anyhow::Result<()> {
        let json = serde_json::to_string(&sample())?;
        assert_eq!(
            json,
            r#"[{"MENTOR":"Pedro","CRITICIDAD":"Alta"},{"MENTOR":"Rosa","CRITICIDAD":"Baja"}]"#
        );
        Ok(())
    }
}
