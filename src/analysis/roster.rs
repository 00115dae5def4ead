//! Dream-team roster
//!
//! Leaderboard of creatures by individual win rate, filtered by a minimum
//! number of recorded fights and joined with descriptive attributes.

use crate::analysis::win_rate::fight_stats;
use crate::analysis::{JOIN_KEY, TYPES_COLUMN};
use crate::data::table::{Cell, Table};
use crate::Result;
use std::collections::HashMap;

/// One leaderboard entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct RosterEntry {
    pub name: Option<String>,
    pub id: String,
    pub types: Option<String>,
    pub fights: u32,
    pub wins: u32,
    /// Win rate as a percentage, rounded to 2 decimal places
    pub win_rate_pct: f64,
}

/// Build the leaderboard: entities with at least `min_fights` recorded
/// fights, sorted by win rate descending.
///
/// Descriptive columns are joined where available; an entity without an
/// attribute row still appears with its bare identifier. No entity meeting
/// the threshold is a benign empty result, not an error.
pub fn dream_team(combats: &Table, attributes: &Table, min_fights: u32) -> Result<Vec<RosterEntry>> {
    let key = attributes.require_column("attributes", JOIN_KEY)?;
    let name_idx = attributes.column("name");
    let types_idx = attributes.column(TYPES_COLUMN);
    let stats = fight_stats(combats)?;

    let mut by_id: HashMap<String, &Vec<Cell>> = HashMap::new();
    for row in attributes.rows() {
        if let Some(id) = row[key].key_string() {
            by_id.entry(id).or_insert(row);
        }
    }

    let mut roster = Vec::new();
    for (id, stat) in &stats {
        let rate = match stat.win_rate() {
            Some(rate) => rate,
            None => continue,
        };
        if stat.fights < min_fights {
            continue;
        }

        let row = by_id.get(id);
        roster.push(RosterEntry {
            name: row.and_then(|r| name_idx.and_then(|i| r[i].key_string())),
            id: id.clone(),
            types: row.and_then(|r| types_idx.and_then(|i| r[i].key_string())),
            fights: stat.fights,
            wins: stat.wins,
            win_rate_pct: (rate * 10000.0).round() / 100.0,
        });
    }

    roster.sort_by(|a, b| {
        b.win_rate_pct
            .partial_cmp(&a.win_rate_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(roster)
}
