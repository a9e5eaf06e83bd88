//! Persisted output table.
//!
//! Rows live in one SQLite table keyed by output date plus row position.
//! Re-running a date replaces every row of that date in one transaction and
//! leaves other dates untouched.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use recon_core::{
    Cell, Error, ReconRow, Result, RowOrigin, Structure, StructureId, TradeRecord,
    OUTPUT_DATE_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

/// Stored time keeps sub-second precision.
const STORE_TIME_FORMAT: &str = "%H:%M:%S%.f";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recon_rows (
    date TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    time TEXT NOT NULL,
    level_value REAL,
    level_formula TEXT,
    ticker TEXT NOT NULL,
    notional REAL,
    size REAL,
    price REAL,
    closing_value REAL,
    closing_formula TEXT,
    volume REAL,
    one_day_change REAL,
    und_tkr TEXT NOT NULL,
    point_value REAL,
    exch TEXT NOT NULL,
    und_cmp_name TEXT NOT NULL,
    und_prc REAL,
    fut_name TEXT NOT NULL,
    structure_id TEXT NOT NULL,
    structure TEXT NOT NULL,
    is_summary INTEGER NOT NULL,
    PRIMARY KEY (date, row_index)
) WITHOUT ROWID;
"#;

const INSERT_ROW: &str = r#"
INSERT INTO recon_rows (
    date, row_index, time, level_value, level_formula, ticker, notional, size,
    price, closing_value, closing_formula, volume, one_day_change, und_tkr,
    point_value, exch, und_cmp_name, und_prc, fut_name, structure_id,
    structure, is_summary
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
    ?17, ?18, ?19, ?20, ?21, ?22
)
"#;

const SELECT_ROWS: &str = r#"
SELECT time, level_value, level_formula, ticker, notional, size, price,
       closing_value, closing_formula, volume, one_day_change, und_tkr,
       point_value, exch, und_cmp_name, und_prc, fut_name, structure_id,
       structure, is_summary
FROM recon_rows
WHERE date = ?1
ORDER BY row_index
"#;

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// Key under which rows of `date` are stored.
pub fn date_key(date: NaiveDate) -> String {
    date.format(OUTPUT_DATE_FORMAT).to_string()
}

/// SQLite-backed store of reconciled rows.
pub struct RollStore {
    conn: Connection,
}

impl RollStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        info!(path = %path.display(), "roll store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Replace every stored row of `date` with `rows`, in output order.
    ///
    /// Returns the number of rows written.
    pub fn replace_date(&mut self, date: NaiveDate, rows: &[ReconRow]) -> Result<usize> {
        let key = date_key(date);
        let tx = self.conn.transaction().map_err(db_err)?;

        let removed = tx
            .execute("DELETE FROM recon_rows WHERE date = ?1", params![key])
            .map_err(db_err)?;

        {
            let mut stmt = tx.prepare(INSERT_ROW).map_err(db_err)?;
            for (index, row) in rows.iter().enumerate() {
                let r = &row.record;
                let (level_value, level_formula) = split_cell(row.level.as_ref());
                let (closing_value, closing_formula) = split_cell(row.closing_1d.as_ref());
                stmt.execute(params![
                    key,
                    index as i64,
                    r.time.format(STORE_TIME_FORMAT).to_string(),
                    level_value,
                    level_formula,
                    r.ticker,
                    r.notional,
                    r.size,
                    r.price,
                    closing_value,
                    closing_formula,
                    r.volume,
                    r.one_day_change,
                    r.underlying_ticker,
                    r.point_value,
                    r.exchange,
                    r.underlying_company_name,
                    r.underlying_price,
                    r.future_name,
                    row.id.to_string(),
                    row.structure.as_str(),
                    row.is_summary(),
                ])
                .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        info!(date = %key, removed, written = rows.len(), "stored reconciled rows");
        Ok(rows.len())
    }

    /// Stored rows of `date`, in output order.
    pub fn rows_for_date(&self, date: NaiveDate) -> Result<Vec<ReconRow>> {
        let mut stmt = self.conn.prepare(SELECT_ROWS).map_err(db_err)?;
        let raw = stmt
            .query_map(params![date_key(date)], StoredRow::from_row)
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;

        raw.into_iter().map(|r| r.into_recon_row(date)).collect()
    }

    /// Every distinct stored date, ascending.
    pub fn processed_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT date FROM recon_rows")
            .map_err(db_err)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut dates: Vec<NaiveDate> = keys
            .iter()
            .filter_map(|key| match NaiveDate::parse_from_str(key, OUTPUT_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    debug!(key = %key, "ignoring unparsable stored date");
                    None
                }
            })
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }

    /// Number of rows stored for `date`.
    pub fn row_count(&self, date: NaiveDate) -> Result<usize> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM recon_rows WHERE date = ?1",
                params![date_key(date)],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(count.unwrap_or(0) as usize)
    }
}

fn split_cell(cell: Option<&Cell>) -> (Option<f64>, Option<&str>) {
    match cell {
        Some(Cell::Number(v)) => (Some(*v), None),
        Some(Cell::Formula(f)) => (None, Some(f.as_str())),
        None => (None, None),
    }
}

fn join_cell(value: Option<f64>, formula: Option<String>) -> Option<Cell> {
    match (value, formula) {
        (_, Some(f)) => Some(Cell::Formula(f)),
        (Some(v), None) => Some(Cell::Number(v)),
        (None, None) => None,
    }
}

/// Column values as read from SQLite, before typed parsing.
struct StoredRow {
    time: String,
    level_value: Option<f64>,
    level_formula: Option<String>,
    ticker: String,
    notional: Option<f64>,
    size: Option<f64>,
    price: Option<f64>,
    closing_value: Option<f64>,
    closing_formula: Option<String>,
    volume: Option<f64>,
    one_day_change: Option<f64>,
    underlying_ticker: String,
    point_value: Option<f64>,
    exchange: String,
    underlying_company_name: String,
    underlying_price: Option<f64>,
    future_name: String,
    structure_id: String,
    structure: String,
    is_summary: bool,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            time: row.get(0)?,
            level_value: row.get(1)?,
            level_formula: row.get(2)?,
            ticker: row.get(3)?,
            notional: row.get(4)?,
            size: row.get(5)?,
            price: row.get(6)?,
            closing_value: row.get(7)?,
            closing_formula: row.get(8)?,
            volume: row.get(9)?,
            one_day_change: row.get(10)?,
            underlying_ticker: row.get(11)?,
            point_value: row.get(12)?,
            exchange: row.get(13)?,
            underlying_company_name: row.get(14)?,
            underlying_price: row.get(15)?,
            future_name: row.get(16)?,
            structure_id: row.get(17)?,
            structure: row.get(18)?,
            is_summary: row.get(19)?,
        })
    }

    fn into_recon_row(self, date: NaiveDate) -> Result<ReconRow> {
        let time = NaiveTime::parse_from_str(&self.time, STORE_TIME_FORMAT)
            .map_err(|e| Error::database(format!("stored time {:?}: {e}", self.time)))?;
        let id: StructureId = self.structure_id.parse()?;
        let structure: Structure = self.structure.parse()?;

        Ok(ReconRow {
            record: TradeRecord {
                time,
                ticker: self.ticker,
                price: self.price,
                size: self.size,
                notional: self.notional,
                volume: self.volume,
                one_day_change: self.one_day_change,
                underlying_ticker: self.underlying_ticker,
                point_value: self.point_value,
                exchange: self.exchange,
                underlying_company_name: self.underlying_company_name,
                underlying_price: self.underlying_price,
                future_name: self.future_name,
                date,
            },
            level: join_cell(self.level_value, self.level_formula),
            closing_1d: join_cell(self.closing_value, self.closing_formula),
            id,
            structure,
            origin: if self.is_summary {
                RowOrigin::Summary
            } else {
                RowOrigin::Trade
            },
        })
    }
}
