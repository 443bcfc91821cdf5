//! The numbers behind a PDI dashboard page: who can be selected, how that
//! person's actions split across the 70-20-10 model, how critical they are,
//! and the matching rows.

use serde::Serialize;
use std::fmt::Write as _;

use crate::{
    config::ReportConfig,
    error::{NormalizeError, Result},
    query::{
        aggregate_counts, filter_rows, resolve_any, resolve_column, sorted_unique_values,
        value_counts, GroupCount, ValueCount,
    },
    table::NormalizedTable,
};

/// Labels the report was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumns {
    pub person: String,
    pub action: String,
    pub criticality: String,
    pub resource: Option<String>,
}

impl ReportColumns {
    pub fn resolve(table: &NormalizedTable, config: &ReportConfig) -> Result<Self> {
        let person = resolve_column(table, config.person_keyword(), None)?.to_string();
        let action = resolve_any(table, config.action_keywords.as_slice(), None)?.to_string();
        let criticality = resolve_column(table, &config.criticality_keyword, None)?.to_string();
        // optional: older sheets have no resource column
        let resource = match resolve_column(
            table,
            &config.resource_keyword,
            config.resource_exclude.as_deref(),
        ) {
            Ok(label) => Some(label.to_string()),
            Err(NormalizeError::ColumnNotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            person,
            action,
            criticality,
            resource,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdiReport {
    pub columns: ReportColumns,
    /// Everyone that can be picked, sorted, placeholders left out.
    pub options: Vec<String>,
    pub selected: Option<String>,
    pub actions: Vec<ValueCount>,
    pub criticality: Vec<ValueCount>,
    /// Per criticality level, the summed resource column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<GroupCount>>,
    pub detail: NormalizedTable,
}

impl PdiReport {
    /// Build the report for `selection`, or for the first option when `None`.
    ///
    /// A selection that is not among the options yields empty counts and an
    /// empty detail table.
    pub fn build(
        table: &NormalizedTable,
        config: &ReportConfig,
        selection: Option<&str>,
    ) -> Result<Self> {
        table.ensure_has_data()?;
        let columns = ReportColumns::resolve(table, config)?;
        let options = sorted_unique_values(table, &columns.person, true)?;

        let selected = selection
            .map(str::to_string)
            .or_else(|| options.first().cloned());
        let detail = match &selected {
            Some(person) => filter_rows(table, &columns.person, person)?,
            None => table.derive(Vec::new()),
        };

        let actions = value_counts(&detail, &columns.action)?;
        let criticality = value_counts(&detail, &columns.criticality)?;
        let resources = columns
            .resource
            .as_deref()
            .map(|res| aggregate_counts(&detail, &[columns.criticality.as_str()], Some(res)))
            .transpose()?;

        Ok(Self {
            columns,
            options,
            selected,
            actions,
            criticality,
            resources,
            detail,
        })
    }

    /// Plain-text rendering for a terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let who = self.selected.as_deref().unwrap_or("-");
        let _ = writeln!(out, "Análisis para: {}", who);
        let _ = writeln!(
            out,
            "Opciones ({}): {}",
            self.columns.person,
            self.options.join(", ")
        );

        section(&mut out, &format!("Modelo 70-20-10 ({})", self.columns.action), &self.actions);
        section(&mut out, &format!("Criticidad ({})", self.columns.criticality), &self.criticality);

        if let (Some(groups), Some(label)) = (&self.resources, &self.columns.resource) {
            let _ = writeln!(out, "\n## Recursos ({})", label);
            for g in groups {
                let _ = writeln!(
                    out,
                    "  {:<30} {:>5} {:>10.2}{}",
                    g.key.join(" / "),
                    g.count,
                    g.sum.unwrap_or(0.0),
                    if g.invalid > 0 {
                        format!("  ({} no numéricos)", g.invalid)
                    } else {
                        String::new()
                    }
                );
            }
        }

        let _ = writeln!(out, "\n## Detalle de registros ({})", self.detail.len());
        let cols = self.detail.columns();
        let _ = writeln!(out, "  {}", cols.join(" | "));
        for record in self.detail.records() {
            let values: Vec<&str> = record.iter().map(|(_, v)| v).collect();
            let _ = writeln!(out, "  {}", values.join(" | "));
        }
        out
    }
}

fn section(out: &mut String, title: &str, counts: &[ValueCount]) {
    let _ = writeln!(out, "\n## {}", title);
    if counts.is_empty() {
        let _ = writeln!(out, "  (sin datos)");
    }
    for c in counts {
        let _ = writeln!(
            out,
            "  {:<30} {:>5} {:>6.1}%",
            c.value,
            c.count,
            c.share * 100.0
        );
    }
}
