//! Roll summary synthesis.
//!
//! Every two-leg roll group gets a synthetic summary row placed before its
//! legs. Single-leg (pre-grouped) rolls are emitted as merged roll rows with
//! no separate summary.

use recon_core::{Cell, ClassifiedTrade, ReconRow, RollLeg, RowOrigin, Structure, TradeRecord};
use tracing::debug;

/// Characters of the second leg's ticker appended to the summary ticker.
const TICKER_SUFFIX_CHARS: usize = 2;
/// Characters of the second leg's future name appended to the summary name.
const FUTURE_NAME_SUFFIX_CHARS: usize = 5;

/// Builds the roll block of the output table.
pub struct Aggregator {
    roll_client_refinement: bool,
}

impl Aggregator {
    /// Create a new aggregator.
    pub fn new(roll_client_refinement: bool) -> Self {
        Self {
            roll_client_refinement,
        }
    }

    /// Expand sorted roll legs into summary and leg rows.
    ///
    /// `rolls` must be ordered by the sequencer's roll key, so each group is
    /// contiguous and its first two entries are leg1 and leg2.
    pub fn aggregate(&self, rolls: Vec<ClassifiedTrade>) -> Vec<ReconRow> {
        let mut rows = Vec::with_capacity(rolls.len() + rolls.len() / 2);
        let mut rest = rolls.as_slice();

        while let Some(head) = rest.first() {
            let counter = head.id.roll_counter();
            let len = rest
                .iter()
                .take_while(|t| t.id.roll_counter() == counter)
                .count();
            let (group, tail) = rest.split_at(len);
            self.expand_group(group, &mut rows);
            rest = tail;
        }

        rows
    }

    fn expand_group(&self, group: &[ClassifiedTrade], rows: &mut Vec<ReconRow>) {
        if let [leg1, leg2, ..] = group {
            let summary = self.summarize(leg1, leg2);
            debug!(
                id = %summary.id,
                ticker = %summary.record.ticker,
                structure = %summary.structure,
                "roll summary"
            );
            rows.push(summary);
        }

        let mut legs: Vec<&ClassifiedTrade> = group.iter().collect();
        legs.sort_by_key(|t| leg_order(t.id.leg()));
        rows.extend(legs.into_iter().map(leg_row));
    }

    /// Synthesize the summary row of a two-leg group.
    pub fn summarize(&self, leg1: &ClassifiedTrade, leg2: &ClassifiedTrade) -> ReconRow {
        let (first, second) = (&leg1.record, &leg2.record);

        let level = first
            .price
            .zip(second.price)
            .filter(|(p1, _)| *p1 != 0.0)
            .map(|(p1, p2)| Cell::Number((p2 / p1 - 1.0) * 100.0));
        let notional = first
            .notional
            .zip(second.notional)
            .map(|(n1, n2)| (n1 + n2) / 2.0);

        let record = TradeRecord {
            ticker: format!(
                "{}{}",
                first.ticker,
                last_chars(&second.ticker, TICKER_SUFFIX_CHARS)
            ),
            notional,
            future_name: format!(
                "{}{}",
                first.future_name,
                last_chars(&second.future_name, FUTURE_NAME_SUFFIX_CHARS)
            ),
            ..first.clone()
        };

        let structure = if self.roll_client_refinement && is_client_priced(first, second) {
            Structure::RollClient
        } else {
            Structure::Roll
        };

        ReconRow {
            record,
            level,
            closing_1d: None,
            id: leg1.id.without_leg(),
            structure,
            origin: RowOrigin::Summary,
        }
    }
}

/// Both legs executed at exactly the same price.
fn is_client_priced(first: &TradeRecord, second: &TradeRecord) -> bool {
    matches!((first.price, second.price), (Some(a), Some(b)) if a == b)
}

/// Position of a leg after its group's summary (which sits at 0).
fn leg_order(leg: Option<RollLeg>) -> u8 {
    match leg {
        Some(RollLeg::First) => 1,
        _ => 2,
    }
}

fn leg_row(trade: &ClassifiedTrade) -> ReconRow {
    let (id, structure) = match trade.id.leg() {
        Some(RollLeg::Single) => (trade.id.without_leg(), Structure::Roll),
        _ => (trade.id, trade.structure),
    };
    ReconRow {
        record: trade.record.clone(),
        level: None,
        closing_1d: None,
        id,
        structure,
        origin: RowOrigin::Trade,
    }
}

/// Trailing `n` characters of `s` (all of `s` if shorter).
fn last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((start, _)) => &s[start..],
        None => s,
    }
}
