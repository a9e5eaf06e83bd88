//! Input normalization.
//!
//! Merges the rows of every usable source batch, coerces typed fields and
//! computes the canonical processing order consumed by the roll matcher.

use chrono::{NaiveDate, NaiveTime};
use recon_core::{Error, Result, TradeRecord};
use tracing::{debug, warn};

use crate::batch::{RawRow, SourceBatch};

/// Result of merging source batches.
#[derive(Debug, Clone, Default)]
pub struct NormalizedInput {
    /// Records in canonical order.
    pub records: Vec<TradeRecord>,
    /// Batches that contributed records.
    pub batches_used: usize,
    /// Names of batches skipped because they failed to load.
    pub batches_skipped: Vec<String>,
}

/// Merges source batches into canonically ordered trade records.
pub struct Normalizer {
    /// Time of day splitting the early bucket from the main session.
    cutoff: NaiveTime,
}

impl Normalizer {
    /// Create a normalizer with the given session cutoff.
    pub fn new(cutoff: NaiveTime) -> Self {
        Self { cutoff }
    }

    /// Merge batches for `date`.
    ///
    /// Batch-local failures are logged and skipped. Any other failure aborts,
    /// as does ending up with no usable batch at all.
    pub fn normalize<I>(&self, batches: I, date: NaiveDate) -> Result<NormalizedInput>
    where
        I: IntoIterator<Item = (String, Result<SourceBatch>)>,
    {
        let mut out = NormalizedInput::default();

        for (name, batch) in batches {
            let converted = batch.and_then(|b| convert_batch(&b, date));
            match converted {
                Ok(records) => {
                    debug!(batch = %name, rows = records.len(), "batch loaded");
                    out.records.extend(records);
                    out.batches_used += 1;
                }
                Err(e) if e.is_batch_local() => {
                    warn!(batch = %name, error = %e, "skipping source batch");
                    out.batches_skipped.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        if out.batches_used == 0 {
            return Err(Error::NoUsableBatches);
        }

        self.canonical_order(&mut out.records);
        Ok(out)
    }

    /// Sort records into canonical processing order.
    ///
    /// Stable ascending sort on `(bucket, time)` where records at or after the
    /// cutoff fall in bucket 0, then the whole sequence is reversed: early
    /// records come first latest-to-earliest, followed by the main session
    /// latest-to-earliest.
    pub fn canonical_order(&self, records: &mut [TradeRecord]) {
        records.sort_by_key(|r| (self.session_bucket(r.time), r.time));
        records.reverse();
    }

    #[inline]
    fn session_bucket(&self, time: NaiveTime) -> u8 {
        if time >= self.cutoff {
            0
        } else {
            1
        }
    }
}

fn convert_batch(batch: &SourceBatch, date: NaiveDate) -> Result<Vec<TradeRecord>> {
    batch
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            convert_row(row, date)
                .map_err(|e| Error::parse(format!("{}: record {}: {e}", batch.name, idx + 1)))
        })
        .collect()
}

fn convert_row(row: &RawRow, date: NaiveDate) -> Result<TradeRecord> {
    let raw_time = row
        .time
        .as_deref()
        .ok_or_else(|| Error::parse("missing time of day"))?;

    Ok(TradeRecord {
        time: parse_time_of_day(raw_time)?,
        ticker: text(&row.ticker),
        price: parse_numeric(row.price.as_deref()),
        size: parse_numeric(row.size.as_deref()),
        notional: parse_numeric(row.notional.as_deref()),
        volume: parse_numeric(row.volume.as_deref()),
        one_day_change: parse_numeric(row.one_day_change.as_deref()),
        underlying_ticker: text(&row.underlying_ticker),
        point_value: parse_numeric(row.point_value.as_deref()),
        exchange: text(&row.exchange),
        underlying_company_name: text(&row.underlying_company_name),
        underlying_price: parse_numeric(row.underlying_price.as_deref()),
        future_name: text(&row.future_name),
        date,
    })
}

/// Parse `HH:MM:SS`, optionally with fractional seconds.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S%.f"))
        .map_err(|_| Error::parse(format!("invalid time of day {raw:?}")))
}

/// Lenient numeric coercion: anything unparsable becomes `None`.
pub fn parse_numeric(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

fn text(raw: &Option<String>) -> String {
    raw.as_deref().map(str::trim).unwrap_or_default().to_string()
}
