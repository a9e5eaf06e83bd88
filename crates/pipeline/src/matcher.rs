//! Roll pairing.
//!
//! Single greedy forward pass over the canonical order. Each unassigned priced
//! record either is a pre-grouped roll instrument, or searches forward for a
//! partner leg: the first candidate inside the tight window wins immediately,
//! otherwise the first candidate inside the extended window wins.

use recon_core::config::MatchConfig;
use recon_core::{RollLeg, StructureId, TradeRecord};
use tracing::debug;

/// Per-record matching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Unassigned,
    Assigned(StructureId),
}

impl MatchState {
    #[inline]
    pub fn is_assigned(&self) -> bool {
        matches!(self, MatchState::Assigned(_))
    }

    pub fn id(&self) -> Option<StructureId> {
        match self {
            MatchState::Assigned(id) => Some(*id),
            MatchState::Unassigned => None,
        }
    }
}

/// Window under which a pair was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairWindow {
    Tight,
    Extended,
}

/// A roll group allocated by the matcher. Indices refer to the matcher input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollGroup {
    /// Pre-grouped roll instrument carried by one record.
    Single { counter: u32, index: usize },
    /// Two matched legs; `first` precedes `second` in canonical order.
    Pair {
        counter: u32,
        first: usize,
        second: usize,
        window: PairWindow,
    },
}

impl RollGroup {
    pub fn counter(&self) -> u32 {
        match *self {
            RollGroup::Single { counter, .. } | RollGroup::Pair { counter, .. } => counter,
        }
    }
}

/// Matching result, aligned with the input records.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub states: Vec<MatchState>,
    /// Groups in allocation (counter) order.
    pub groups: Vec<RollGroup>,
}

/// Greedy nearest-candidate roll matcher.
pub struct RollMatcher {
    config: MatchConfig,
}

impl RollMatcher {
    /// Create a new matcher.
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Pair records given in canonical order.
    ///
    /// Records without a price never take part in matching.
    pub fn match_rolls(&self, records: &[TradeRecord]) -> MatchOutcome {
        let mut states = vec![MatchState::Unassigned; records.len()];
        let mut groups = Vec::new();
        let mut counter = 0u32;

        for i in 0..records.len() {
            if states[i].is_assigned() || !records[i].is_priced() {
                continue;
            }
            let anchor = &records[i];

            if anchor.ticker.chars().count() == self.config.pregrouped_ticker_len {
                counter += 1;
                states[i] = MatchState::Assigned(StructureId::roll_leg(
                    anchor.date,
                    counter,
                    RollLeg::Single,
                ));
                groups.push(RollGroup::Single { counter, index: i });
                continue;
            }

            let Some((j, window)) = self.find_partner(records, &states, i) else {
                debug!(ticker = %anchor.ticker, time = %anchor.time, "no roll partner");
                continue;
            };

            counter += 1;
            states[i] = MatchState::Assigned(StructureId::roll_leg(
                anchor.date,
                counter,
                RollLeg::First,
            ));
            states[j] = MatchState::Assigned(StructureId::roll_leg(
                records[j].date,
                counter,
                RollLeg::Second,
            ));
            debug!(
                counter,
                first = %anchor.ticker,
                second = %records[j].ticker,
                ?window,
                "roll paired"
            );
            groups.push(RollGroup::Pair {
                counter,
                first: i,
                second: j,
                window,
            });
        }

        MatchOutcome { states, groups }
    }

    /// Scan forward from `i` for the winning partner.
    fn find_partner(
        &self,
        records: &[TradeRecord],
        states: &[MatchState],
        i: usize,
    ) -> Option<(usize, PairWindow)> {
        let anchor = &records[i];
        let mut extended: Option<usize> = None;

        for (j, candidate) in records.iter().enumerate().skip(i + 1) {
            if states[j].is_assigned() || !candidate.is_priced() {
                continue;
            }
            if !self.is_similar(anchor, candidate) {
                continue;
            }

            let apart = anchor.seconds_apart(candidate);
            if apart <= self.config.tight_window_secs {
                return Some((j, PairWindow::Tight));
            }
            if apart <= self.config.extended_window_secs && extended.is_none() {
                extended = Some(j);
            }
        }

        extended.map(|j| (j, PairWindow::Extended))
    }

    /// Shared prefix, distinct ticker, size and price within tolerance of the anchor.
    fn is_similar(&self, anchor: &TradeRecord, candidate: &TradeRecord) -> bool {
        let prefix_len = self.config.prefix_len;
        ticker_prefix(&anchor.ticker, prefix_len) == ticker_prefix(&candidate.ticker, prefix_len)
            && anchor.ticker != candidate.ticker
            && size_within_tolerance(anchor.size, candidate.size, self.config.size_tolerance)
            && within_tolerance(anchor.price, candidate.price, self.config.price_tolerance)
    }
}

/// Leading `n` characters of a ticker (the whole ticker if shorter).
pub fn ticker_prefix(ticker: &str, n: usize) -> &str {
    match ticker.char_indices().nth(n) {
        Some((end, _)) => &ticker[..end],
        None => ticker,
    }
}

/// `|reference - value| <= tolerance * reference`. Missing values never match.
fn within_tolerance(reference: Option<f64>, value: Option<f64>, tolerance: f64) -> bool {
    match (reference, value) {
        (Some(r), Some(v)) => (r - v).abs() <= tolerance * r,
        _ => false,
    }
}

/// Size variant of [`within_tolerance`]: a missing size on either side never
/// rejects the candidate, only two known sizes are compared.
fn size_within_tolerance(reference: Option<f64>, value: Option<f64>, tolerance: f64) -> bool {
    match (reference, value) {
        (Some(r), Some(v)) => (r - v).abs() <= tolerance * r,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn trade(ticker: &str, price: Option<f64>, size: f64, time: &str) -> TradeRecord {
        TradeRecord {
            time: NaiveTime::parse_from_str(time, "%H:%M:%S%.f").unwrap(),
            ticker: ticker.to_string(),
            price,
            size: Some(size),
            notional: None,
            volume: None,
            one_day_change: None,
            underlying_ticker: String::new(),
            point_value: None,
            exchange: String::new(),
            underlying_company_name: String::new(),
            underlying_price: None,
            future_name: String::new(),
            date: date(),
        }
    }

    fn unsized_trade(ticker: &str, price: f64, time: &str) -> TradeRecord {
        TradeRecord {
            size: None,
            ..trade(ticker, Some(price), 0.0, time)
        }
    }

    fn matcher() -> RollMatcher {
        RollMatcher::new(MatchConfig::default())
    }

    fn id(state: &MatchState) -> String {
        state.id().map(|id| id.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_tight_pair() {
        let records = vec![
            trade("ABCM5", Some(100.02), 10.0, "09:01:30"),
            trade("ABCH5", Some(100.00), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(id(&outcome.states[0]), "20240315-R-1-L1");
        assert_eq!(id(&outcome.states[1]), "20240315-R-1-L2");
        assert_eq!(
            outcome.groups,
            vec![RollGroup::Pair {
                counter: 1,
                first: 0,
                second: 1,
                window: PairWindow::Tight
            }]
        );
    }

    #[test]
    fn test_tight_boundary_inclusive() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "09:02:00"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(matches!(
            outcome.groups[0],
            RollGroup::Pair { window: PairWindow::Tight, .. }
        ));
    }

    #[test]
    fn test_just_past_tight_falls_to_extended() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "09:02:00.010"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(matches!(
            outcome.groups[0],
            RollGroup::Pair { window: PairWindow::Extended, .. }
        ));
    }

    #[test]
    fn test_sub_millisecond_past_tight_falls_to_extended() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "09:02:00.0009"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(matches!(
            outcome.groups[0],
            RollGroup::Pair { window: PairWindow::Extended, .. }
        ));
    }

    #[test]
    fn test_missing_size_does_not_block_pairing() {
        let records = vec![
            unsized_trade("ABCM5", 100.02, "09:01:30"),
            unsized_trade("ABCH5", 100.00, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(id(&outcome.states[0]), "20240315-R-1-L1");
        assert_eq!(id(&outcome.states[1]), "20240315-R-1-L2");

        let one_sided = vec![
            trade("ABCM5", Some(100.0), 10.0, "09:01:30"),
            unsized_trade("ABCH5", 100.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&one_sided);
        assert_eq!(outcome.groups.len(), 1);
        assert!(matches!(outcome.groups[0], RollGroup::Pair { .. }));
    }

    #[test]
    fn test_missing_price_still_rejects() {
        let records = vec![
            trade("ABCM5", None, 10.0, "09:01:30"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(outcome.groups.iter().all(|g| !matches!(g, RollGroup::Pair { .. })));
    }

    #[test]
    fn test_later_tight_beats_earlier_extended() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "12:00:00"),
            trade("ABCU5", Some(100.0), 10.0, "10:00:00"),
            trade("ABCH5", Some(100.0), 10.0, "11:59:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(
            outcome.groups[0],
            RollGroup::Pair {
                counter: 1,
                first: 0,
                second: 2,
                window: PairWindow::Tight
            }
        );
        assert_eq!(outcome.states[1], MatchState::Unassigned);
    }

    #[test]
    fn test_first_extended_candidate_wins() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "12:00:00"),
            trade("ABCU5", Some(100.0), 10.0, "10:00:00"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(
            outcome.groups[0],
            RollGroup::Pair {
                counter: 1,
                first: 0,
                second: 1,
                window: PairWindow::Extended
            }
        );
    }

    #[test]
    fn test_beyond_extended_window_unmatched() {
        let records = vec![
            trade("ABCM5", Some(100.0), 10.0, "12:00:00"),
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(outcome.groups.is_empty());
        assert!(outcome.states.iter().all(|s| !s.is_assigned()));
    }

    #[test]
    fn test_rejects_dissimilar_candidates() {
        let records = vec![
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
            // same ticker
            trade("ABCH5", Some(100.0), 10.0, "09:00:10"),
            // different prefix
            trade("ACM5", Some(100.0), 10.0, "09:00:20"),
            // size off by more than 5%
            trade("ABCM5", Some(100.0), 10.6, "09:00:30"),
            // price off by more than 5%
            trade("ABCU5", Some(105.1), 10.0, "09:00:40"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn test_tolerance_is_relative_to_anchor() {
        let records = vec![
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
            trade("ABCM5", Some(104.9), 10.4, "09:00:30"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(outcome.groups.len(), 1);
    }

    #[test]
    fn test_seven_char_ticker_is_single_leg() {
        let records = vec![
            trade("ABH5M5X", Some(100.0), 10.0, "09:00:00"),
            trade("ABCM5", Some(100.0), 10.0, "09:00:10"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(id(&outcome.states[0]), "20240315-R-1-L0");
        assert_eq!(outcome.states[1], MatchState::Unassigned);
        assert_eq!(outcome.groups, vec![RollGroup::Single { counter: 1, index: 0 }]);
    }

    #[test]
    fn test_unpriced_records_ignored() {
        let records = vec![
            trade("ABCH5", None, 10.0, "09:00:00"),
            trade("ABCM5", Some(100.0), 10.0, "09:00:10"),
            trade("ABU5M5X", None, 10.0, "09:00:20"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn test_assigned_records_not_reclaimed() {
        let records = vec![
            trade("ABCH5", Some(100.0), 10.0, "09:00:00"),
            trade("ABCM5", Some(100.0), 10.0, "09:00:10"),
            trade("ABCU5", Some(100.0), 10.0, "09:00:20"),
            trade("ABCZ5", Some(100.0), 10.0, "09:00:30"),
        ];
        let outcome = matcher().match_rolls(&records);
        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(id(&outcome.states[2]), "20240315-R-2-L1");
        assert_eq!(id(&outcome.states[3]), "20240315-R-2-L2");
    }

    #[test]
    fn test_ticker_prefix() {
        assert_eq!(ticker_prefix("ABCH5", 3), "ABC");
        assert_ne!(ticker_prefix("ABH5", 3), ticker_prefix("ABM5", 3));
        assert_eq!(ticker_prefix("AB", 3), "AB");
        assert_eq!(ticker_prefix("ÉTÉ5", 2), "ÉT");
    }
}
