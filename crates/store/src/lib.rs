//! Output persistence for the roll reconciliation system.
//!
//! This crate handles:
//! - CSV export of the reconciled table
//! - SQLite store with replace-by-date semantics
//! - Processed-date calendar queries

pub mod calendar;
pub mod export;
pub mod store;

pub use calendar::{recent_months, MonthActivity};
pub use export::{export_csv, render_row, write_csv_file};
pub use store::RollStore;
