//! Structure classification.
//!
//! Turns match outcomes into final identifiers: unpriced records become
//! screens, matched records keep their roll id, everything else is an outright.

use chrono::NaiveDate;
use recon_core::{ClassifiedTrade, Error, Result, Structure, StructureId, TradeRecord};

use crate::matcher::MatchOutcome;

/// Statistics about classification.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    /// Total records classified.
    pub total_records: u64,
    /// Records labeled `Leg`.
    pub legs: u64,
    /// Records labeled `Screen`.
    pub screens: u64,
    /// Records labeled `Outright`.
    pub outrights: u64,
}

impl ClassificationStats {
    fn record(&mut self, structure: Structure) {
        self.total_records += 1;
        match structure {
            Structure::Leg => self.legs += 1,
            Structure::Screen => self.screens += 1,
            Structure::Outright => self.outrights += 1,
            _ => {}
        }
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Assigns structure identifiers and labels after matching.
#[derive(Default)]
pub struct StructureClassifier {
    stats: ClassificationStats,
}

impl StructureClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a single record given its matching result.
    pub fn classify(
        &mut self,
        record: TradeRecord,
        matched: Option<StructureId>,
        date: NaiveDate,
    ) -> ClassifiedTrade {
        let id = if !record.is_priced() {
            StructureId::screen(date)
        } else {
            matched.unwrap_or_else(|| StructureId::outright(date))
        };

        let classified = ClassifiedTrade::new(record, id);
        self.stats.record(classified.structure);
        classified
    }

    /// Classify all records of a run. `outcome` must be aligned with `records`.
    pub fn classify_batch(
        &mut self,
        records: Vec<TradeRecord>,
        outcome: &MatchOutcome,
        date: NaiveDate,
    ) -> Result<Vec<ClassifiedTrade>> {
        if records.len() != outcome.states.len() {
            return Err(Error::data(format!(
                "match outcome covers {} records, expected {}",
                outcome.states.len(),
                records.len()
            )));
        }

        Ok(records
            .into_iter()
            .zip(outcome.states.iter())
            .map(|(record, state)| self.classify(record, state.id(), date))
            .collect())
    }

    /// Get classification statistics.
    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
