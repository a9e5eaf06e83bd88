//! Property tests for reconciliation invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism: identical input gives identical rows
//! 2. Coverage: every input record lands in exactly one output row
//! 3. Pairing exclusivity: no record is claimed by two roll groups
//! 4. Null routing: unpriced records always end as Screen
//! 5. Formula placement follows the structure label

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use recon_core::{Config, RollLeg, Structure, StructureId, TradeRecord};
use recon_ingestion::Normalizer;
use recon_pipeline::{ReconEngine, ReconOutput};

// ── Strategies (proptest) ────────────────────────────────────────────

const TICKERS: [&str; 7] = ["SXEH5", "SXEM5", "SXEU5", "FDXH5", "FDXM5", "SXEH5M5", "ZZZZ5"];

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn arb_record() -> impl Strategy<Value = TradeRecord> {
    (
        prop::sample::select(TICKERS.to_vec()),
        prop::option::weighted(0.85, prop::sample::select(vec![100.0, 100.5, 103.0, 120.0])),
        prop::sample::select(vec![10.0, 10.3, 12.0]),
        0u32..86_400,
    )
        .prop_map(|(ticker, price, size, secs)| TradeRecord {
            time: NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap(),
            ticker: ticker.to_string(),
            price,
            size: Some(size),
            notional: price.map(|p| p * size),
            volume: None,
            one_day_change: None,
            underlying_ticker: ticker[..3].to_string(),
            point_value: Some(10.0),
            exchange: "EUX".to_string(),
            underlying_company_name: String::new(),
            underlying_price: None,
            future_name: format!("{ticker} FUT"),
            date: date(),
        })
}

fn arb_day() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec(arb_record(), 0..40)
}

fn reconcile(mut records: Vec<TradeRecord>) -> ReconOutput {
    let config = Config::default();
    Normalizer::new(config.session.cutoff).canonical_order(&mut records);
    ReconEngine::new(config)
        .unwrap()
        .reconcile(records, date())
        .unwrap()
}

proptest! {
    /// Repeated runs over the same records give the same table.
    #[test]
    fn output_is_deterministic(records in arb_day()) {
        let first = reconcile(records.clone());
        let second = reconcile(records);
        prop_assert_eq!(first.rows, second.rows);
        prop_assert_eq!(first.stats, second.stats);
    }

    /// Every input record appears once; summaries are the only extra rows.
    #[test]
    fn every_record_is_covered(records in arb_day()) {
        let n = records.len();
        let out = reconcile(records);

        let trade_rows = out.rows.iter().filter(|r| !r.is_summary()).count();
        let summaries = out.rows.iter().filter(|r| r.is_summary()).count();
        prop_assert_eq!(trade_rows, n);
        prop_assert_eq!(summaries, out.stats.roll_pairs);
        prop_assert_eq!(out.rows.len(), out.stats.output_rows);

        for row in &out.rows {
            if row.is_summary() {
                prop_assert!(matches!(row.structure, Structure::Roll | Structure::RollClient));
            } else {
                prop_assert_eq!(row.structure, row.id.structure());
            }
        }
    }

    /// Each roll counter has exactly one L1 and one L2, or is a lone L0 roll.
    #[test]
    fn roll_groups_are_exclusive(records in arb_day()) {
        let out = reconcile(records);
        let mut legs: HashMap<u32, Vec<Option<RollLeg>>> = HashMap::new();
        for row in out.rows.iter().filter(|r| !r.is_summary()) {
            if let StructureId::Roll { counter, leg, .. } = row.id {
                legs.entry(counter).or_default().push(leg);
            }
        }

        prop_assert_eq!(legs.len(), out.stats.roll_pairs + out.stats.single_rolls);
        for group in legs.values() {
            let mut group = group.clone();
            group.sort_by_key(|l| l.map(RollLeg::index));
            prop_assert!(
                group == vec![None] || group == vec![Some(RollLeg::First), Some(RollLeg::Second)],
                "unexpected group {:?}",
                group
            );
        }
    }

    /// Records without a price are always screens.
    #[test]
    fn unpriced_records_are_screens(records in arb_day()) {
        let out = reconcile(records);
        for row in out.rows.iter().filter(|r| !r.is_summary()) {
            prop_assert_eq!(row.record.price.is_none(), row.structure == Structure::Screen);
        }
    }

    /// Prior-close references sit exactly on Roll, Roll-Client and Outright rows.
    #[test]
    fn closing_reference_follows_structure(records in arb_day()) {
        let out = reconcile(records);
        for row in &out.rows {
            prop_assert_eq!(row.closing_1d.is_some(), row.structure.has_closing_reference());
        }
    }
}
