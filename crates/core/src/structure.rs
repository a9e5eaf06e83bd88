//! Structure identifiers and the structure taxonomy.
//!
//! A [`StructureId`] is the persisted key of a record (`20240315-R-4-L1`,
//! `20240315-S`, ...). The [`Structure`] label is assigned from the typed id at
//! classification time; the string form is only parsed back when rows are read
//! from storage.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Date layout embedded in structure identifiers.
pub const ID_DATE_FORMAT: &str = "%Y%m%d";

/// Leg marker of a roll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RollLeg {
    /// Pre-grouped roll instrument carried by a single record (`L0`).
    Single,
    /// Anchor leg of a matched pair (`L1`), first in processing order.
    First,
    /// Partner leg found by the forward scan (`L2`).
    Second,
}

impl RollLeg {
    /// Numeric leg index used in the identifier suffix.
    pub fn index(self) -> u8 {
        match self {
            RollLeg::Single => 0,
            RollLeg::First => 1,
            RollLeg::Second => 2,
        }
    }

    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(RollLeg::Single),
            1 => Some(RollLeg::First),
            2 => Some(RollLeg::Second),
            _ => None,
        }
    }
}

/// Typed structure identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureId {
    /// Roll record. `leg` is `None` for a group-level row (summary or merged
    /// single-leg roll).
    Roll {
        date: NaiveDate,
        counter: u32,
        leg: Option<RollLeg>,
    },
    /// Quote-only record without a price.
    Screen { date: NaiveDate },
    /// Priced record that is not part of a roll.
    Outright { date: NaiveDate },
}

impl StructureId {
    /// Identifier of one leg of roll group `counter`.
    pub fn roll_leg(date: NaiveDate, counter: u32, leg: RollLeg) -> Self {
        StructureId::Roll {
            date,
            counter,
            leg: Some(leg),
        }
    }

    /// Group-level identifier of roll group `counter`.
    pub fn roll_group(date: NaiveDate, counter: u32) -> Self {
        StructureId::Roll {
            date,
            counter,
            leg: None,
        }
    }

    pub fn screen(date: NaiveDate) -> Self {
        StructureId::Screen { date }
    }

    pub fn outright(date: NaiveDate) -> Self {
        StructureId::Outright { date }
    }

    /// Trade date embedded in the identifier.
    pub fn date(&self) -> NaiveDate {
        match *self {
            StructureId::Roll { date, .. }
            | StructureId::Screen { date }
            | StructureId::Outright { date } => date,
        }
    }

    /// Roll group counter, if this is a roll identifier.
    pub fn roll_counter(&self) -> Option<u32> {
        match *self {
            StructureId::Roll { counter, .. } => Some(counter),
            _ => None,
        }
    }

    /// Leg marker, if this is a leg-level roll identifier.
    pub fn leg(&self) -> Option<RollLeg> {
        match *self {
            StructureId::Roll { leg, .. } => leg,
            _ => None,
        }
    }

    /// Strip the leg suffix of a roll identifier.
    pub fn without_leg(&self) -> Self {
        match *self {
            StructureId::Roll { date, counter, .. } => StructureId::roll_group(date, counter),
            other => other,
        }
    }

    /// Structure label carried by a freshly classified record with this id.
    pub fn structure(&self) -> Structure {
        match self {
            StructureId::Roll { leg: Some(_), .. } => Structure::Leg,
            StructureId::Roll { leg: None, .. } => Structure::Roll,
            StructureId::Screen { .. } => Structure::Screen,
            StructureId::Outright { .. } => Structure::Outright,
        }
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date().format(ID_DATE_FORMAT);
        match self {
            StructureId::Roll {
                counter,
                leg: Some(leg),
                ..
            } => write!(f, "{}-R-{}-L{}", date, counter, leg.index()),
            StructureId::Roll {
                counter, leg: None, ..
            } => write!(f, "{}-R-{}", date, counter),
            StructureId::Screen { .. } => write!(f, "{}-S", date),
            StructureId::Outright { .. } => write!(f, "{}-O", date),
        }
    }
}

impl FromStr for StructureId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::parse(format!("invalid structure id: {s:?}"));
        let (date_part, rest) = s.split_once('-').ok_or_else(bad)?;
        let date = NaiveDate::parse_from_str(date_part, ID_DATE_FORMAT).map_err(|_| bad())?;

        match rest {
            "S" => Ok(StructureId::screen(date)),
            "O" => Ok(StructureId::outright(date)),
            _ => {
                let roll = rest.strip_prefix("R-").ok_or_else(bad)?;
                let (counter, leg) = match roll.split_once("-L") {
                    Some((counter, leg)) => {
                        let index: u8 = leg.parse().map_err(|_| bad())?;
                        (counter, Some(RollLeg::from_index(index).ok_or_else(bad)?))
                    }
                    None => (roll, None),
                };
                let counter: u32 = counter.parse().map_err(|_| bad())?;
                Ok(StructureId::Roll { date, counter, leg })
            }
        }
    }
}

/// Structure taxonomy label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Structure {
    /// One leg of a two-leg roll.
    Leg,
    /// Quote-only record (no price).
    Screen,
    /// Priced single-instrument record.
    Outright,
    /// Roll summary row, or a pre-grouped single-leg roll.
    Roll,
    /// Roll summary whose legs were executed at an identical price.
    #[serde(rename = "Roll-Client")]
    RollClient,
    /// Anything the identifier rules do not recognise.
    Other,
}

impl Structure {
    /// Coarse grouping priority of the sequencer (lower sorts first).
    pub fn group_priority(self) -> u8 {
        match self {
            Structure::Leg | Structure::Roll | Structure::RollClient => 0,
            Structure::Screen => 1,
            Structure::Outright => 2,
            Structure::Other => 3,
        }
    }

    /// Whether the row references the prior-day close of its ticker.
    pub fn has_closing_reference(self) -> bool {
        matches!(
            self,
            Structure::Roll | Structure::RollClient | Structure::Outright
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Structure::Leg => "Leg",
            Structure::Screen => "Screen",
            Structure::Outright => "Outright",
            Structure::Roll => "Roll",
            Structure::RollClient => "Roll-Client",
            Structure::Other => "Other",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Structure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Leg" => Ok(Structure::Leg),
            "Screen" => Ok(Structure::Screen),
            "Outright" => Ok(Structure::Outright),
            "Roll" => Ok(Structure::Roll),
            "Roll-Client" => Ok(Structure::RollClient),
            "Other" => Ok(Structure::Other),
            _ => Err(Error::parse(format!("unknown structure label: {s:?}"))),
        }
    }
}
