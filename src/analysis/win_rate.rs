//! Per-entity fight statistics
//!
//! Shared by the type win-rate and roster analyses: total fights count both
//! participant slots, wins count appearances in the winner column.

use crate::analysis::{FIRST_SLOT, SECOND_SLOT, WINNER};
use crate::data::table::Table;
use crate::Result;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct FightStats {
    pub fights: u32,
    pub wins: u32,
}

impl FightStats {
    /// Win rate, defined only for entities with at least one fight.
    pub fn win_rate(&self) -> Option<f64> {
        if self.fights == 0 {
            None
        } else {
            Some(self.wins as f64 / self.fights as f64)
        }
    }
}

/// Compute per-entity fight statistics from the combat table, keyed on the
/// canonical identifier form.
///
/// A winner that matches neither participant of its row is tolerated but
/// credits nobody.
pub fn fight_stats(combats: &Table) -> Result<HashMap<String, FightStats>> {
    let first = combats.require_column("combat list", FIRST_SLOT)?;
    let second = combats.require_column("combat list", SECOND_SLOT)?;
    let winner = combats.require_column("combat list", WINNER)?;

    let mut stats: HashMap<String, FightStats> = HashMap::new();
    for row in combats.rows() {
        let first_id = row[first].key_string();
        let second_id = row[second].key_string();

        for id in [&first_id, &second_id].into_iter().flatten() {
            stats.entry(id.clone()).or_default().fights += 1;
        }

        if let Some(win_id) = row[winner].key_string() {
            let matches_participant =
                Some(&win_id) == first_id.as_ref() || Some(&win_id) == second_id.as_ref();
            if matches_participant {
                if let Some(entry) = stats.get_mut(&win_id) {
                    entry.wins += 1;
                }
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn combats(rows: &[(i64, i64, i64)]) -> Table {
        let records: Vec<_> = rows
            .iter()
            .map(|(a, b, w)| json!({"first_pokemon": a, "second_pokemon": b, "winner": w}))
            .collect();
        Table::from_records(&records)
    }

    #[test]
    fn test_fights_count_both_slots() {
        let table = combats(&[(1, 2, 1), (2, 1, 1), (1, 3, 3)]);
        let stats = fight_stats(&table).unwrap();

        assert_eq!(stats["1"].fights, 3);
        assert_eq!(stats["1"].wins, 2);
        assert_eq!(stats["2"].fights, 2);
        assert_eq!(stats["2"].wins, 0);
        assert_eq!(stats["3"].fights, 1);
        assert_eq!(stats["3"].wins, 1);
    }

    #[test]
    fn test_win_rate_seven_of_ten() {
        let mut rows = Vec::new();
        for _ in 0..7 {
            rows.push((1, 2, 1));
        }
        for _ in 0..3 {
            rows.push((1, 2, 2));
        }
        let stats = fight_stats(&combats(&rows)).unwrap();
        assert_eq!(stats["1"].win_rate(), Some(0.7));
    }

    #[test]
    fn test_zero_fights_has_no_win_rate() {
        let stats = FightStats::default();
        assert_eq!(stats.win_rate(), None);
    }

    #[test]
    fn test_unmatched_winner_credits_nobody() {
        let table = combats(&[(1, 2, 9)]);
        let stats = fight_stats(&table).unwrap();

        assert_eq!(stats["1"].wins, 0);
        assert_eq!(stats["2"].wins, 0);
        // the stray winner id gains no fights either
        assert!(!stats.contains_key("9"));
    }

    #[test]
    fn test_missing_winner_column_is_schema_error() {
        let table = Table::from_records(&[json!({"first_pokemon": 1, "second_pokemon": 2})]);
        let err = fight_stats(&table).unwrap_err();
        assert!(err.to_string().contains("winner"));
    }
}
