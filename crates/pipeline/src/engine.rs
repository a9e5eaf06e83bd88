//! Reconciliation engine.
//!
//! Runs normalization, roll matching, classification, sequencing, summary
//! aggregation and formula annotation in order for one trade date.

use chrono::NaiveDate;
use recon_core::{Config, ReconRow, Result, Structure, TradeRecord};
use recon_ingestion::{Normalizer, SourceBatch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::Aggregator;
use crate::annotator::Annotator;
use crate::classifier::StructureClassifier;
use crate::matcher::{MatchOutcome, PairWindow, RollGroup, RollMatcher};
use crate::sequencer::sequence;

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconStats {
    /// Records after merging all usable batches.
    pub input_records: usize,
    /// Batches that contributed records.
    pub batches_used: usize,
    /// Batches skipped because they failed to load.
    pub batches_skipped: usize,
    /// Two-leg roll groups.
    pub roll_pairs: usize,
    /// Pairs accepted under the tight window.
    pub tight_pairs: usize,
    /// Pairs accepted under the extended window.
    pub extended_pairs: usize,
    /// Pre-grouped single-record rolls.
    pub single_rolls: usize,
    /// Summaries upgraded to `Roll-Client`.
    pub roll_clients: usize,
    pub legs: usize,
    pub screens: usize,
    pub outrights: usize,
    /// Rows in the final table, summaries included.
    pub output_rows: usize,
}

impl ReconStats {
    fn from_outcome(outcome: &MatchOutcome) -> Self {
        let mut stats = Self::default();
        for group in &outcome.groups {
            match group {
                RollGroup::Single { .. } => stats.single_rolls += 1,
                RollGroup::Pair { window, .. } => {
                    stats.roll_pairs += 1;
                    match window {
                        PairWindow::Tight => stats.tight_pairs += 1,
                        PairWindow::Extended => stats.extended_pairs += 1,
                    }
                }
            }
        }
        stats
    }
}

/// Output of one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconOutput {
    /// Trade date of the run.
    pub date: NaiveDate,
    /// Final table rows in output order.
    pub rows: Vec<ReconRow>,
    pub stats: ReconStats,
}

/// Runs the reconciliation pipeline.
pub struct ReconEngine {
    config: Config,
}

impl ReconEngine {
    /// Create an engine. Fails on an invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge source batches and reconcile them for `date`.
    pub fn run<I>(&self, batches: I, date: NaiveDate) -> Result<ReconOutput>
    where
        I: IntoIterator<Item = (String, Result<SourceBatch>)>,
    {
        let input = Normalizer::new(self.config.session.cutoff).normalize(batches, date)?;
        let mut output = self.reconcile(input.records, date)?;
        output.stats.batches_used = input.batches_used;
        output.stats.batches_skipped = input.batches_skipped.len();
        Ok(output)
    }

    /// Reconcile records that are already in canonical order.
    pub fn reconcile(&self, records: Vec<TradeRecord>, date: NaiveDate) -> Result<ReconOutput> {
        let input_records = records.len();

        let outcome = RollMatcher::new(self.config.matching.clone()).match_rolls(&records);
        let mut stats = ReconStats::from_outcome(&outcome);
        stats.input_records = input_records;

        let mut classifier = StructureClassifier::new();
        let classified = classifier.classify_batch(records, &outcome, date)?;
        let class_stats = classifier.stats();
        stats.legs = (class_stats.legs as usize).saturating_sub(stats.single_rolls);
        stats.screens = class_stats.screens as usize;
        stats.outrights = class_stats.outrights as usize;

        let sequenced = sequence(classified);
        let aggregator = Aggregator::new(self.config.output.roll_client_refinement);

        let mut rows = aggregator.aggregate(sequenced.rolls);
        rows.extend(sequenced.screens.into_iter().map(ReconRow::from));
        rows.extend(sequenced.outrights.into_iter().map(ReconRow::from));

        Annotator::new(self.config.output.outright_level_formula)?.annotate(&mut rows);

        stats.roll_clients = rows
            .iter()
            .filter(|r| r.structure == Structure::RollClient)
            .count();
        stats.output_rows = rows.len();

        info!(
            %date,
            records = stats.input_records,
            pairs = stats.roll_pairs,
            single_rolls = stats.single_rolls,
            roll_clients = stats.roll_clients,
            screens = stats.screens,
            outrights = stats.outrights,
            "reconciliation complete"
        );

        Ok(ReconOutput { date, rows, stats })
    }
}
