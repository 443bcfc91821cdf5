// src/grid/load.rs
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Serialize;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::{Cell, RawGrid};

/// What kind of reader a path needs, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Workbook,
    Delimited(u8),
}

fn source_kind(path: &Path) -> Result<SourceKind> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Workbook),
        "csv" | "txt" => Ok(SourceKind::Delimited(b',')),
        "tsv" => Ok(SourceKind::Delimited(b'\t')),
        _ => bail!("unsupported file type {:?} for {}", ext, path.display()),
    }
}

/// Read `path` into a grid without any header handling.
///
/// Workbooks use the sheet named `sheet`, or the first sheet when `None`.
/// Delimited files ignore `sheet`.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_grid<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<RawGrid> {
    let path = path.as_ref();
    let grid = match source_kind(path)? {
        SourceKind::Workbook => load_workbook_sheet(path, sheet)?,
        SourceKind::Delimited(delim) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            load_delimited(file, delim)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
    };
    info!(rows = grid.len(), cols = grid.width(), "loaded grid");
    Ok(grid)
}

fn load_workbook_sheet(path: &Path, sheet: Option<&str>) -> Result<RawGrid> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let names = workbook.sheet_names();

    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "sheet '{}' not found in {} (available: {})",
                    wanted,
                    path.display(),
                    names.join(", ")
                )
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook {} has no sheets", path.display()))?,
    };
    debug!(sheet = %sheet_name, "reading worksheet");

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet '{}'", sheet_name))?;

    let rows = range
        .rows()
        .map(|r| r.iter().map(data_to_cell).collect())
        .collect();
    Ok(RawGrid::new(rows))
}

fn data_to_cell(d: &Data) -> Cell {
    match d {
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(excel_datetime_text(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Dates as `YYYY-MM-DD HH:MM:SS`, the way the sheet's users read them;
/// durations and out-of-range serials keep calamine's own rendering.
fn excel_datetime_text(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(naive) if dt.is_datetime() => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => dt.to_string(),
    }
}

/// Parse delimited text with no header row and tolerant record lengths.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn load_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RawGrid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("parse error at record {}", idx))?;
        rows.push(
            record
                .iter()
                .map(|field| Cell::from(String::from_utf8_lossy(field).into_owned()))
                .collect(),
        );
    }
    Ok(RawGrid::new(rows))
}

/// Identity of one loaded source: where it lives, how big it was and when it
/// last changed. Two loads with equal fingerprints read the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub modified: DateTime<Utc>,
    pub sheet: Option<String>,
}

impl SourceFingerprint {
    pub fn of<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        let meta = fs::metadata(&canonical)
            .with_context(|| format!("failed to stat {}", canonical.display()))?;
        let modified = meta
            .modified()
            .with_context(|| format!("no modification time for {}", canonical.display()))?;
        Ok(Self {
            path: canonical,
            len: meta.len(),
            modified: DateTime::<Utc>::from(modified),
            sheet: sheet.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use calamine::ExcelDateTimeType;
    use std::io::{Cursor, Write};
    use tempfile::{Builder, NamedTempFile};
    use zip::{write::SimpleFileOptions, ZipWriter};

    /// Smallest xlsx calamine accepts: workbook, relationships and one
    /// worksheet part per sheet, cells as inline strings or numbers.
    fn write_xlsx(sheets: &[(&str, &[&[&str]])]) -> Result<NamedTempFile> {
        let mut file = Builder::new().suffix(".xlsx").tempfile()?;
        let mut writer = ZipWriter::new(file.as_file_mut());
        let options = SimpleFileOptions::default();

        let mut entries = String::new();
        let mut rels = String::new();
        for (i, (name, rows)) in sheets.iter().enumerate() {
            let id = i + 1;
            entries.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name, id, id
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                id, id
            ));

            let mut data = String::new();
            for (r, row) in rows.iter().enumerate() {
                data.push_str(&format!(r#"<row r="{}">"#, r + 1));
                for (c, value) in row.iter().enumerate() {
                    let cell_ref = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                    if value.parse::<f64>().is_ok() {
                        data.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
                    } else {
                        data.push_str(&format!(
                            r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                            cell_ref, value
                        ));
                    }
                }
                data.push_str("</row>");
            }
            writer.start_file(format!("xl/worksheets/sheet{}.xml", id), options)?;
            write!(
                writer,
                r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                data
            )?;
        }

        writer.start_file("xl/workbook.xml", options)?;
        write!(
            writer,
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
            entries
        )?;
        writer.start_file("xl/_rels/workbook.xml.rels", options)?;
        write!(
            writer,
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )?;
        writer.finish()?;
        Ok(file)
    }

    #[test]
    fn delimited_keeps_leading_rows_and_ragged_records() -> Result<()> {
        let content = "ANALISIS PDI\n,,\nMENTOR,ACCION,CRITICIDAD\nPedro,70% Experiencia,Alta\n";
        let grid = load_delimited(Cursor::new(content), b',')?;

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.row(0).map(<[Cell]>::len), Some(1));
        assert!(grid.row(1).is_some_and(|r| r.iter().all(Cell::is_blank)));
        assert_eq!(grid.cell(2, 2), &Cell::Text("CRITICIDAD".into()));
        Ok(())
    }

    #[test]
    fn delimited_preserves_quoted_line_breaks() -> Result<()> {
        let content = "MENTEE,TIPO DE ACCIÓN\nAna,\"70%\nExperiencia\"\n";
        let grid = load_delimited(Cursor::new(content), b',')?;
        assert_eq!(grid.cell(1, 1), &Cell::Text("70%\nExperiencia".into()));
        Ok(())
    }

    #[test]
    fn load_grid_dispatches_on_extension() -> Result<()> {
        let mut tsv = Builder::new().suffix(".tsv").tempfile()?;
        writeln!(tsv, "MENTOR\tCRITICIDAD")?;
        writeln!(tsv, "Pedro\tAlta")?;
        let grid = load_grid(tsv.path(), None)?;
        assert_eq!(grid.cell(1, 1), &Cell::Text("Alta".into()));

        let other = Builder::new().suffix(".json").tempfile()?;
        assert!(load_grid(other.path(), None).is_err());
        Ok(())
    }

    #[test]
    fn fingerprint_changes_with_content() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "MENTOR")?;
        let first = SourceFingerprint::of(file.path(), Some("PDI"))?;
        let again = SourceFingerprint::of(file.path(), Some("PDI"))?;
        assert_eq!(first, again);

        writeln!(file, "Pedro")?;
        file.flush()?;
        let grown = SourceFingerprint::of(file.path(), Some("PDI"))?;
        assert_ne!(first.len, grown.len);
        assert_ne!(first, grown);

        let other_sheet = SourceFingerprint::of(file.path(), None)?;
        assert_ne!(grown, other_sheet);
        Ok(())
    }

    #[test]
    fn workbook_reads_named_sheet_after_title_rows() -> Result<()> {
        let file = write_xlsx(&[
            ("Portada", &[&["DASHBOARD PDI"]]),
            (
                "PDI_CONSOLIDADOS",
                &[
                    &["ANALISIS PDI"],
                    &["LIDER MENTOR", "CRITICIDAD", "RECURSO"],
                    &["Pedro", "Alta", "2"],
                ],
            ),
        ])?;

        let grid = load_grid(file.path(), Some("PDI_CONSOLIDADOS"))?;
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.cell(1, 0), &Cell::Text("LIDER MENTOR".into()));
        assert_eq!(grid.cell(2, 2).to_text(), "2");
        Ok(())
    }

    #[test]
    fn workbook_defaults_to_first_sheet() -> Result<()> {
        let file = write_xlsx(&[
            ("Portada", &[&["DASHBOARD PDI"]]),
            ("PDI_CONSOLIDADOS", &[&["MENTOR"]]),
        ])?;
        let grid = load_grid(file.path(), None)?;
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cell(0, 0), &Cell::Text("DASHBOARD PDI".into()));
        Ok(())
    }

    #[test]
    fn missing_sheet_lists_available_names() -> Result<()> {
        let file = write_xlsx(&[("Portada", &[&["x"]]), ("Hoja2", &[&["y"]])])?;
        let err = load_grid(file.path(), Some("PDI_CONSOLIDADOS")).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("sheet 'PDI_CONSOLIDADOS' not found"), "{}", msg);
        assert!(msg.contains("available: Portada, Hoja2"), "{}", msg);
        Ok(())
    }

    #[test]
    fn excel_dates_render_as_calendar_text() {
        let date = Data::DateTime(ExcelDateTime::new(
            45366.0,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(data_to_cell(&date).to_text(), "2024-03-15 00:00:00");

        let noon = Data::DateTime(ExcelDateTime::new(
            45366.5,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(data_to_cell(&noon).to_text(), "2024-03-15 12:00:00");

        let epoch_1904 = Data::DateTime(ExcelDateTime::new(
            43904.0,
            ExcelDateTimeType::DateTime,
            true,
        ));
        assert_eq!(data_to_cell(&epoch_1904).to_text(), "2024-03-15 00:00:00");
    }
}
