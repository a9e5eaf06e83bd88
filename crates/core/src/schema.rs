//! Input and output table schemas.

use serde::{Deserialize, Serialize};

use crate::structure::{Structure, StructureId};
use crate::types::{ClassifiedTrade, TradeRecord};

/// Column carrying the time of day. Required in every source batch.
pub const TIME_COLUMN: &str = "Time";

/// Input columns, in export order.
pub const INPUT_COLUMNS: [&str; 13] = [
    "Time",
    "Ticker",
    "Price",
    "Size",
    "Notional",
    "Volume",
    "1DChg",
    "UndTkr",
    "1PtVal",
    "Exch",
    "UndCmpName",
    "UndPrc",
    "FutName",
];

/// Output columns. Position `k` maps to spreadsheet column letter `A + k`.
pub const OUTPUT_COLUMNS: [&str; 18] = [
    "Time",
    "Level",
    "Ticker",
    "Notional",
    "Size",
    "Price",
    "Closing1d",
    "Volume",
    "1DChg",
    "UndTkr",
    "1PtVal",
    "Exch",
    "UndCmpName",
    "UndPrc",
    "Date",
    "FutName",
    "StructureId",
    "Structure",
];

/// First spreadsheet row holding data (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// Spreadsheet column letter of an output column.
pub fn column_letter(name: &str) -> Option<char> {
    OUTPUT_COLUMNS
        .iter()
        .position(|c| *c == name)
        .and_then(|idx| char::from_u32('A' as u32 + idx as u32))
}

/// Spreadsheet row number of the output row at `index`.
#[inline]
pub fn spreadsheet_row(index: usize) -> usize {
    index + FIRST_DATA_ROW
}

/// A cell whose value is either literal or evaluated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    /// Spreadsheet formula, written verbatim including the leading `=`.
    Formula(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Formula(_) => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Cell::Formula(f) => Some(f),
            Cell::Number(_) => None,
        }
    }
}

/// Where an output row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOrigin {
    /// Input trade record.
    Trade,
    /// Synthesized roll summary.
    Summary,
}

/// One row of the reconciled output table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconRow {
    /// Record values. For summaries these are the synthesized values.
    pub record: TradeRecord,
    /// `Level` cell: roll spread in percent, or an Outright ratio formula.
    pub level: Option<Cell>,
    /// `Closing1d` cell: prior-close reference formula.
    pub closing_1d: Option<Cell>,
    /// Persisted structure key.
    pub id: StructureId,
    pub structure: Structure,
    pub origin: RowOrigin,
}

impl ReconRow {
    pub fn is_summary(&self) -> bool {
        self.origin == RowOrigin::Summary
    }
}

impl From<ClassifiedTrade> for ReconRow {
    fn from(trade: ClassifiedTrade) -> Self {
        Self {
            record: trade.record,
            level: None,
            closing_1d: None,
            id: trade.id,
            structure: trade.structure,
            origin: RowOrigin::Trade,
        }
    }
}
