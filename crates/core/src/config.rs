//! Configuration structures for the roll reconciliation system.

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration for a reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roll pairing thresholds.
    pub matching: MatchConfig,
    /// Canonical ordering configuration.
    pub session: SessionConfig,
    /// Output variant switches.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        if m.tight_window_secs <= 0.0 {
            return Err(Error::config("matching.tight_window_secs must be positive"));
        }
        if m.extended_window_secs < m.tight_window_secs {
            return Err(Error::config(
                "matching.extended_window_secs must be >= matching.tight_window_secs",
            ));
        }
        if m.size_tolerance < 0.0 || m.price_tolerance < 0.0 {
            return Err(Error::config("matching tolerances must be non-negative"));
        }
        if m.prefix_len == 0 {
            return Err(Error::config("matching.prefix_len must be at least 1"));
        }
        if self.output.calendar_months == 0 {
            return Err(Error::config("output.calendar_months must be at least 1"));
        }
        Ok(())
    }
}

/// Roll pairing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Tight pairing window in seconds (inclusive). First tight hit wins.
    pub tight_window_secs: f64,
    /// Extended fallback window in seconds (inclusive).
    pub extended_window_secs: f64,
    /// Maximum relative size difference, as a fraction of the earlier leg.
    pub size_tolerance: f64,
    /// Maximum relative price difference, as a fraction of the earlier leg.
    pub price_tolerance: f64,
    /// Number of leading ticker characters two legs must share.
    pub prefix_len: usize,
    /// Ticker length that marks an already-grouped roll instrument.
    pub pregrouped_ticker_len: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tight_window_secs: 120.0,
            extended_window_secs: 10_000.0,
            size_tolerance: 0.05,
            price_tolerance: 0.05,
            prefix_len: 3,
            pregrouped_ticker_len: 7,
        }
    }
}

/// Canonical ordering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Records at or after this time-of-day sort into the main session bucket.
    pub cutoff: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cutoff: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Upgrade roll summaries whose legs share a price to `Roll-Client`.
    pub roll_client_refinement: bool,
    /// Write Outright `Level` as a `Price / Closing1d` formula.
    pub outright_level_formula: bool,
    /// Months covered by the processed-date calendar.
    pub calendar_months: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            roll_client_refinement: true,
            outright_level_formula: true,
            calendar_months: 3,
        }
    }
}
