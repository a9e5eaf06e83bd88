//! Deterministic output ordering.
//!
//! Records are grouped by structure (stable, so canonical order survives
//! within a group), split into roll / screen / outright subsets, and each
//! subset is sorted by its own key.

use recon_core::{ClassifiedTrade, StructureId};

/// Classified records split and sorted per subset.
#[derive(Debug, Clone, Default)]
pub struct Sequenced {
    /// Roll legs, sorted by [`roll_sort_key`].
    pub rolls: Vec<ClassifiedTrade>,
    /// Screens, by time of day.
    pub screens: Vec<ClassifiedTrade>,
    /// Outrights, by time of day.
    pub outrights: Vec<ClassifiedTrade>,
}

/// Order classified records.
pub fn sequence(mut trades: Vec<ClassifiedTrade>) -> Sequenced {
    trades.sort_by_key(|t| t.structure.group_priority());

    let mut out = Sequenced::default();
    for trade in trades {
        match trade.id {
            StructureId::Roll { .. } => out.rolls.push(trade),
            StructureId::Screen { .. } => out.screens.push(trade),
            StructureId::Outright { .. } => out.outrights.push(trade),
        }
    }

    out.rolls.sort_by_key(roll_sort_key);
    out.screens.sort_by_key(|t| t.record.time);
    out.outrights.sort_by_key(|t| t.record.time);
    out
}

/// Sort key of a roll leg: group counter, then contract year digit, then
/// contract month code.
///
/// This ordering decides which leg of a pair is treated as the first leg when
/// summaries are built.
pub fn roll_sort_key(trade: &ClassifiedTrade) -> (u32, u32, u32) {
    let counter = trade.id.roll_counter().unwrap_or(u32::MAX);
    let mut tail = trade.record.ticker.chars().rev();
    let year = tail.next().and_then(|c| c.to_digit(10)).unwrap_or(u32::MAX);
    let month = tail.next().map(month_code_rank).unwrap_or(99);
    (counter, year, month)
}

/// Rank of a quarterly futures month code.
pub fn month_code_rank(code: char) -> u32 {
    match code {
        'H' => 1,
        'M' => 2,
        'U' => 3,
        'Z' => 4,
        _ => 99,
    }
}
