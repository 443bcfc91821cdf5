// src/query/mod.rs
//! Pure lookups over a [`NormalizedTable`](crate::table::NormalizedTable).
//! None of them mutate their input.

pub mod aggregate;
pub mod columns;
pub mod filter;

pub use aggregate::{aggregate_counts, value_counts, GroupCount, ValueCount};
pub use columns::{resolve_any, resolve_column, resolve_column_strict, ColumnIndex};
pub use filter::{filter_rows, sorted_unique_values, unique_values};
