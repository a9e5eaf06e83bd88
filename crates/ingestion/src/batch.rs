//! Source batch loading.
//!
//! A batch is one CSV export with a header row. Columns are matched by name;
//! unknown columns are ignored and absent optional columns read as empty.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use recon_core::schema::TIME_COLUMN;
use recon_core::{Error, Result};
use serde::Deserialize;

/// One raw input row, as text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Time", default)]
    pub time: Option<String>,
    #[serde(rename = "Ticker", default)]
    pub ticker: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<String>,
    #[serde(rename = "Size", default)]
    pub size: Option<String>,
    #[serde(rename = "Notional", default)]
    pub notional: Option<String>,
    #[serde(rename = "Volume", default)]
    pub volume: Option<String>,
    #[serde(rename = "1DChg", default)]
    pub one_day_change: Option<String>,
    #[serde(rename = "UndTkr", default)]
    pub underlying_ticker: Option<String>,
    #[serde(rename = "1PtVal", default)]
    pub point_value: Option<String>,
    #[serde(rename = "Exch", default)]
    pub exchange: Option<String>,
    #[serde(rename = "UndCmpName", default)]
    pub underlying_company_name: Option<String>,
    #[serde(rename = "UndPrc", default)]
    pub underlying_price: Option<String>,
    #[serde(rename = "FutName", default)]
    pub future_name: Option<String>,
}

/// Rows of one source, in file order.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Display name of the source (usually the file path).
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// Read a batch from any CSV reader.
///
/// A header without a `Time` column is fatal for the run. A malformed record
/// fails only this batch.
pub fn read_batch<R: Read>(name: &str, reader: R) -> Result<SourceBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| Error::parse(format!("{name}: unreadable header: {e}")))?;
    if headers.is_empty() {
        return Err(Error::parse(format!("{name}: empty source")));
    }
    if !headers.iter().any(|h| h == TIME_COLUMN) {
        return Err(Error::missing_column(format!("{TIME_COLUMN} (in {name})")));
    }

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize::<RawRow>().enumerate() {
        let row = result
            .map_err(|e| Error::parse(format!("{name}: record {}: {e}", line + 1)))?;
        rows.push(row);
    }

    Ok(SourceBatch {
        name: name.to_string(),
        rows,
    })
}

/// Load a batch from a CSV file on disk.
pub fn load_batch(path: &Path) -> Result<SourceBatch> {
    let file = File::open(path)?;
    read_batch(&path.display().to_string(), file)
}
