//! Win rate by creature type
//!
//! Explodes each creature's type-tag list into one row per tag, joins the
//! per-creature win rates, and averages them per type.

use crate::analysis::win_rate::fight_stats;
use crate::analysis::{JOIN_KEY, TYPES_COLUMN};
use crate::data::table::{Cell, Table};
use crate::Result;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Mean win rate of all creatures carrying one type tag
#[derive(Debug, Clone, serde::Serialize)]
pub struct TypeWinRate {
    pub type_name: String,
    pub mean_win_rate: f64,
    /// Number of creatures that contributed to the mean
    pub entity_count: usize,
}

/// Group mean win rate by type tag, sorted descending.
///
/// Creatures without any recorded fight contribute to no group. A creature
/// with several tags contributes its single win rate to each of them.
pub fn type_win_rates(combats: &Table, attributes: &Table) -> Result<Vec<TypeWinRate>> {
    let key = attributes.require_column("attributes", JOIN_KEY)?;
    let types_idx = attributes.require_column("attributes", TYPES_COLUMN)?;
    let stats = fight_stats(combats)?;

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for row in attributes.rows() {
        let id = match row[key].key_string() {
            Some(id) => id,
            None => continue,
        };
        let rate = match stats.get(&id).and_then(|s| s.win_rate()) {
            Some(rate) => rate,
            None => continue,
        };
        for tag in parse_tags(&row[types_idx]) {
            let entry = sums.entry(tag).or_insert((0.0, 0));
            entry.0 += rate;
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<TypeWinRate> = sums
        .into_iter()
        .map(|(type_name, (sum, count))| TypeWinRate {
            type_name,
            mean_win_rate: sum / count as f64,
            entity_count: count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.mean_win_rate
            .partial_cmp(&a.mean_win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.type_name.cmp(&b.type_name))
    });
    Ok(ranked)
}

/// Parse a type-tag cell into a list of tags. Never fails: anything that is
/// not recognizably a list degrades to a single tag holding its string form,
/// and null cells carry no tags.
pub fn parse_tags(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Null => Vec::new(),
        Cell::Text(raw) => parse_tag_text(raw),
        other => vec![other.to_string()],
    }
}

fn parse_tag_text(raw: &str) -> Vec<String> {
    if let Ok(Json::Array(items)) = serde_json::from_str::<Json>(raw) {
        return items
            .iter()
            .map(|item| match item {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
    }

    // list renditions with single quotes, e.g. ['grass', 'poison']
    let trimmed = raw.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return trimmed[1..trimmed.len() - 1]
            .split(',')
            .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|part| !part.is_empty())
            .collect();
    }

    vec![raw.to_string()]
}
