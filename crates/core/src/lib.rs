//! Core types and configuration for the roll reconciliation system.
//!
//! This crate provides shared types used across all other crates:
//! - Trade records and classified trades
//! - Structure identifiers and the structure taxonomy
//! - Input/output table schemas
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod schema;
pub mod structure;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use schema::{Cell, ReconRow, RowOrigin};
pub use structure::{RollLeg, Structure, StructureId};
pub use types::*;
