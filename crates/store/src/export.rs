//! Output table export.
//!
//! Writes reconciled rows in the fixed output column order. Formula cells
//! are written verbatim so the downstream spreadsheet evaluates them.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use recon_core::schema::OUTPUT_COLUMNS;
use recon_core::{Cell, Error, ReconRow, Result, OUTPUT_DATE_FORMAT};

/// Layout of the `Time` column in the exported table. Fractional seconds are
/// printed only when present.
pub const EXPORT_TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Write `rows` as CSV, header first.
pub fn export_csv<W: Write>(rows: &[ReconRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(OUTPUT_COLUMNS)
        .map_err(|e| Error::export(e.to_string()))?;
    for row in rows {
        wtr.write_record(render_row(row))
            .map_err(|e| Error::export(format!("row {}: {e}", row.id)))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `rows` to a CSV file at `path`, replacing any existing file.
pub fn write_csv_file(path: &Path, rows: &[ReconRow]) -> Result<()> {
    let file = File::create(path)?;
    export_csv(rows, file)
}

/// Render one row as text cells in output column order.
pub fn render_row(row: &ReconRow) -> [String; 18] {
    let r = &row.record;
    [
        r.time.format(EXPORT_TIME_FORMAT).to_string(),
        cell(row.level.as_ref()),
        r.ticker.clone(),
        number(r.notional),
        number(r.size),
        number(r.price),
        cell(row.closing_1d.as_ref()),
        number(r.volume),
        number(r.one_day_change),
        r.underlying_ticker.clone(),
        number(r.point_value),
        r.exchange.clone(),
        r.underlying_company_name.clone(),
        number(r.underlying_price),
        r.date.format(OUTPUT_DATE_FORMAT).to_string(),
        r.future_name.clone(),
        row.id.to_string(),
        row.structure.to_string(),
    ]
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn cell(value: Option<&Cell>) -> String {
    match value {
        Some(Cell::Number(v)) => v.to_string(),
        Some(Cell::Formula(f)) => f.clone(),
        None => String::new(),
    }
}
