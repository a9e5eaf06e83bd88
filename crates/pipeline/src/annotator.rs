//! Deferred-reference formulas.
//!
//! Fills `Closing1d` with a prior-close lookup for every priced structure row
//! and, optionally, turns Outright `Level` into a `Price / Closing1d` ratio.
//! Both are spreadsheet formulas evaluated downstream; their text must match
//! the external query syntax byte for byte.

use recon_core::schema::{column_letter, spreadsheet_row};
use recon_core::{Cell, Error, ReconRow, Result, Structure};

/// External field code for the prior trading day's close.
pub const PRIOR_CLOSE_FIELD: &str = "PX_CLOSE_1D";

/// Attaches formula placeholders to final output rows.
pub struct Annotator {
    ticker_col: char,
    date_col: char,
    price_col: char,
    closing_col: char,
    outright_level_formula: bool,
}

impl Annotator {
    /// Create an annotator bound to the output schema's column letters.
    pub fn new(outright_level_formula: bool) -> Result<Self> {
        let letter = |name: &str| {
            column_letter(name)
                .ok_or_else(|| Error::data(format!("output schema has no {name} column")))
        };
        Ok(Self {
            ticker_col: letter("UndTkr")?,
            date_col: letter("Date")?,
            price_col: letter("Price")?,
            closing_col: letter("Closing1d")?,
            outright_level_formula,
        })
    }

    /// Annotate rows in their final order. Row `index` lives on spreadsheet
    /// row `index + 2`.
    pub fn annotate(&self, rows: &mut [ReconRow]) {
        for (index, row) in rows.iter_mut().enumerate() {
            let n = spreadsheet_row(index);
            row.closing_1d = row
                .structure
                .has_closing_reference()
                .then(|| Cell::Formula(self.closing_formula(n)));

            if self.outright_level_formula && row.structure == Structure::Outright {
                row.level = Some(Cell::Formula(self.ratio_formula(n)));
            }
        }
    }

    /// Prior-close lookup for spreadsheet row `n`.
    pub fn closing_formula(&self, n: usize) -> String {
        format!(
            "=BDH({t}{n}&\" Index\", \"{field}\",{d}{n},{d}{n})",
            t = self.ticker_col,
            d = self.date_col,
            field = PRIOR_CLOSE_FIELD,
        )
    }

    /// `Price / Closing1d` ratio for spreadsheet row `n`.
    pub fn ratio_formula(&self, n: usize) -> String {
        format!("=({}{n}/{}{n})", self.price_col, self.closing_col)
    }
}
