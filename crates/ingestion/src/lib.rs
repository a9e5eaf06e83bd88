//! Data ingestion and normalization for the roll reconciliation system.
//!
//! This crate handles:
//! - Loading CSV source batches
//! - Merging batches and coercing typed fields
//! - Canonical processing order (session bucket, then latest first)

pub mod batch;
pub mod normalizer;

pub use batch::{load_batch, read_batch, RawRow, SourceBatch};
pub use normalizer::{parse_numeric, parse_time_of_day, NormalizedInput, Normalizer};
