//! Core data types for the roll reconciliation system.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::structure::{Structure, StructureId};

/// Layout of the trade date as typed by the operator.
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout of the `Date` column in the output table and the store.
pub const OUTPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse the run's trade date (`YYYY-MM-DD`).
pub fn parse_trade_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), INPUT_DATE_FORMAT)
        .map_err(|e| Error::invalid_date(format!("{input:?}: {e}")))
}

/// One row of trading activity after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Time of day of the trade.
    pub time: NaiveTime,
    /// Instrument ticker.
    pub ticker: String,
    /// Trade price. `None` for quote-only (screen) rows.
    pub price: Option<f64>,
    /// Trade size.
    pub size: Option<f64>,
    pub notional: Option<f64>,
    pub volume: Option<f64>,
    /// One-day change (`1DChg`).
    pub one_day_change: Option<f64>,
    /// Underlying ticker (`UndTkr`).
    pub underlying_ticker: String,
    /// Point value (`1PtVal`).
    pub point_value: Option<f64>,
    /// Exchange code (`Exch`).
    pub exchange: String,
    /// Underlying company name (`UndCmpName`).
    pub underlying_company_name: String,
    /// Underlying price (`UndPrc`).
    pub underlying_price: Option<f64>,
    /// Future name (`FutName`).
    pub future_name: String,
    /// Trade date of the run. Identical across all records of a run.
    pub date: NaiveDate,
}

impl TradeRecord {
    /// Whether the record carries a price.
    #[inline]
    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }

    /// Absolute time separation from `other` in seconds.
    pub fn seconds_apart(&self, other: &TradeRecord) -> f64 {
        let delta = other.time.signed_duration_since(self.time);
        let secs = match delta.num_nanoseconds() {
            Some(nanos) => nanos as f64 / 1e9,
            None => delta.num_milliseconds() as f64 / 1e3,
        };
        secs.abs()
    }
}

/// A record with its structure identifier and label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTrade {
    /// Original record.
    pub record: TradeRecord,
    /// Assigned identifier. Never changes once assigned.
    pub id: StructureId,
    /// Taxonomy label derived from `id`.
    pub structure: Structure,
}

impl ClassifiedTrade {
    /// Classify a record from its identifier.
    pub fn new(record: TradeRecord, id: StructureId) -> Self {
        let structure = id.structure();
        Self {
            record,
            id,
            structure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::RollLeg;

    fn record(time: &str) -> TradeRecord {
        TradeRecord {
            time: NaiveTime::parse_from_str(time, "%H:%M:%S%.f").unwrap(),
            ticker: "ABH5".to_string(),
            price: Some(100.0),
            size: Some(10.0),
            notional: None,
            volume: None,
            one_day_change: None,
            underlying_ticker: String::new(),
            point_value: None,
            exchange: String::new(),
            underlying_company_name: String::new(),
            underlying_price: None,
            future_name: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }
    }

    #[test]
    fn test_parse_trade_date() {
        assert_eq!(
            parse_trade_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(matches!(
            parse_trade_date("15/03/2024"),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_seconds_apart_is_symmetric() {
        let a = record("09:00:00");
        let b = record("09:01:30.250");
        assert!((a.seconds_apart(&b) - 90.25).abs() < 1e-9);
        assert!((b.seconds_apart(&a) - 90.25).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_apart_keeps_sub_millisecond_precision() {
        let a = record("09:00:00");
        let b = record("09:02:00.0009");
        assert!(a.seconds_apart(&b) > 120.0);
        assert!((a.seconds_apart(&b) - 120.0009).abs() < 1e-9);
    }

    #[test]
    fn test_classified_trade_label() {
        let rec = record("09:00:00");
        let id = StructureId::roll_leg(rec.date, 1, RollLeg::First);
        let classified = ClassifiedTrade::new(rec, id);
        assert_eq!(classified.structure, Structure::Leg);
    }
}
