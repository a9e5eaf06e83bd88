//! Reconciliation stages for the roll reconciliation system.
//!
//! This crate handles:
//! - Roll pairing across the canonical record order
//! - Structure classification (Leg, Screen, Outright)
//! - Deterministic output sequencing
//! - Roll summary synthesis
//! - Prior-close and ratio formula annotation

pub mod matcher;
pub mod classifier;
pub mod sequencer;
pub mod aggregator;
pub mod annotator;
pub mod engine;

pub use matcher::{MatchOutcome, MatchState, PairWindow, RollGroup, RollMatcher};
pub use classifier::{ClassificationStats, StructureClassifier};
pub use sequencer::{sequence, Sequenced};
pub use aggregator::Aggregator;
pub use annotator::Annotator;
pub use engine::{ReconEngine, ReconOutput, ReconStats};
