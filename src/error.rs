//! Named failures of the normalizer and its queries.
//!
//! Everything raised here reaches the immediate caller unchanged. Loading,
//! caching and the CLI work in `anyhow` and wrap these with context.

use std::fmt;

pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// No row contained a marker token. Only ever reported as a warning:
    /// the normalizer carries on with row 0 as the header.
    HeaderNotFound { markers: Vec<String> },

    /// A keyword (or an exact label) matched no column.
    ColumnNotFound {
        keyword: String,
        available: Vec<String>,
    },

    /// The table had no data rows to aggregate.
    EmptyTable,

    /// Several columns share a label, or a strict lookup matched more than one.
    AmbiguousColumn {
        label: String,
        positions: Vec<usize>,
    },

    /// Grouping needs at least one column.
    InvalidGrouping,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound { markers } => write!(
                f,
                "no header row contains any of [{}]; using the first row",
                markers.join(", ")
            ),
            Self::ColumnNotFound { keyword, available } => write!(
                f,
                "could not find a column for '{}' (detected columns: {})",
                keyword,
                available.join(", ")
            ),
            Self::EmptyTable => write!(f, "the table has no data rows"),
            Self::AmbiguousColumn { label, positions } => write!(
                f,
                "column '{}' is ambiguous: it appears at positions {:?}",
                label, positions
            ),
            Self::InvalidGrouping => write!(f, "grouping needs at least one column"),
        }
    }
}

impl std::error::Error for NormalizeError {}

impl NormalizeError {
    /// Labels the table actually had, when the error carries them.
    pub fn available_columns(&self) -> Option<&[String]> {
        match self {
            Self::ColumnNotFound { available, .. } => Some(available),
            _ => None,
        }
    }
}
