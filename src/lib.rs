//! Header detection and column normalization for hand-made spreadsheets.
//!
//! A sheet exported by people rather than programs usually starts with a
//! title, a logo row or a few blank lines before the real header. This crate
//! finds that header row by marker tokens, promotes it to column labels,
//! drops decorative rows and columns, and answers keyword-based column
//! lookups over the result.
//!
//! ```text
//! RawGrid ─ locate_header_row ─ promote_header ─▶ NormalizedTable
//!                                                   │
//!           resolve_column / unique_values / filter_rows / aggregate_counts
//! ```
//!
//! [`query::resolve_column`] takes the first label containing the keyword;
//! use [`query::resolve_column_strict`] to fail with
//! [`NormalizeError::AmbiguousColumn`] when several do, or
//! [`query::ColumnIndex`] to see every match per keyword at once.

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod query;
pub mod report;
pub mod table;

pub use error::NormalizeError;
pub use grid::{Cell, RawGrid};
pub use normalize::{
    locate_header_row, normalize, promote_header, DuplicatePolicy, HeaderLocation, Normalized,
    NormalizeOptions,
};
pub use table::{NormalizedTable, Record};
