use serde::Serialize;
use tracing::{debug, warn};

use crate::{error::NormalizeError, grid::RawGrid};

/// Where the header row was found, and whether a marker put it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderLocation {
    /// A cell in this row contained `marker`.
    Marker { row: usize, marker: String },
    /// Nothing matched; row 0 is used as the header.
    Fallback { markers: Vec<String> },
}

impl HeaderLocation {
    pub fn row(&self) -> usize {
        match self {
            HeaderLocation::Marker { row, .. } => *row,
            HeaderLocation::Fallback { .. } => 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, HeaderLocation::Fallback { .. })
    }

    /// The low-confidence warning for a fallback location.
    pub fn warning(&self) -> Option<NormalizeError> {
        match self {
            HeaderLocation::Fallback { markers } => Some(NormalizeError::HeaderNotFound {
                markers: markers.clone(),
            }),
            HeaderLocation::Marker { .. } => None,
        }
    }
}

/// Index of the first row with a cell containing any of `markers`
/// (case-insensitive substring), or row 0 flagged as a fallback.
pub fn locate_header_row<S: AsRef<str>>(grid: &RawGrid, markers: &[S]) -> HeaderLocation {
    let wanted: Vec<String> = markers
        .iter()
        .map(|m| m.as_ref().trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .collect();

    for (idx, row) in grid.rows().iter().enumerate() {
        for cell in row {
            let text = cell.to_text().to_uppercase();
            if let Some(marker) = wanted.iter().find(|m| text.contains(m.as_str())) {
                debug!(row = idx, marker = %marker, "header row located");
                return HeaderLocation::Marker {
                    row: idx,
                    marker: marker.clone(),
                };
            }
        }
    }

    warn!(markers = ?wanted, "no header marker found, falling back to row 0");
    HeaderLocation::Fallback { markers: wanted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn first_marker_row_wins() {
        let grid = RawGrid::from_rows(vec![
            vec!["REPORTE MENTORES 2024"],
            vec!["LIDER MENTOR", "ACCION"],
            vec!["MENTOR", "ACCION"],
        ]);
        let loc = locate_header_row(&grid, &["mentor"]);
        assert_eq!(loc.row(), 0);
        assert!(!loc.is_fallback());
        assert!(loc.warning().is_none());
    }

    #[test]
    fn skips_title_rows_without_markers() {
        let grid = RawGrid::new(vec![
            vec![Cell::Text("ANALISIS PDI".into())],
            vec![Cell::Empty, Cell::Number(2024.0)],
            vec![Cell::Text("Mentee".into()), Cell::Text("TIPO DE ACCIÓN".into())],
        ]);
        assert_eq!(
            locate_header_row(&grid, &["MENTEE"]),
            HeaderLocation::Marker {
                row: 2,
                marker: "MENTEE".into()
            }
        );
    }

    #[test]
    fn falls_back_to_first_row() {
        let grid = RawGrid::from_rows(vec![vec!["A", "B"], vec!["1", "2"]]);
        let loc = locate_header_row(&grid, &["MENTOR"]);
        assert_eq!(loc.row(), 0);
        assert!(loc.is_fallback());
        assert!(matches!(
            loc.warning(),
            Some(NormalizeError::HeaderNotFound { markers }) if markers == vec!["MENTOR".to_string()]
        ));
    }

    #[test]
    fn empty_markers_never_match() {
        let grid = RawGrid::from_rows(vec![vec!["MENTOR"]]);
        assert!(locate_header_row(&grid, &[" "]).is_fallback());
        assert!(locate_header_row::<&str>(&grid, &[]).is_fallback());
    }
}
