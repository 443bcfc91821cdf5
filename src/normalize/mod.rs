// src/normalize/mod.rs
pub mod clean;
pub mod header;
pub mod promote;

pub use header::{locate_header_row, HeaderLocation};
pub use promote::{promote_header, DuplicatePolicy};

use serde::Serialize;

use crate::{
    error::{NormalizeError, Result},
    grid::RawGrid,
    table::NormalizedTable,
};

/// Inputs of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Tokens that identify the header row, e.g. `["MENTOR"]`.
    pub markers: Vec<String>,
    pub duplicates: DuplicatePolicy,
}

impl NormalizeOptions {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }
}

/// A normalized table plus how its header was found.
#[derive(Debug, Clone, Serialize)]
pub struct Normalized {
    pub header: HeaderLocation,
    pub table: NormalizedTable,
}

impl Normalized {
    /// `HeaderNotFound` when no marker matched and row 0 was assumed.
    pub fn warning(&self) -> Option<NormalizeError> {
        self.header.warning()
    }
}

/// `locate_header_row` followed by `promote_header`.
#[tracing::instrument(level = "debug", skip_all, fields(rows = grid.len(), markers = ?options.markers))]
pub fn normalize(grid: &RawGrid, options: &NormalizeOptions) -> Result<Normalized> {
    let header = locate_header_row(grid, options.markers.as_slice());
    let table = promote_header(grid, header.row(), options.duplicates)?;
    Ok(Normalized { header, table })
}
