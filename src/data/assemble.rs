//! Dataset assembly
//!
//! Orchestrates the three Kaisen resources (creature list, per-creature
//! attributes, combat list) into flat tables and writes them as snapshots.

use crate::data::api::ApiClient;
use crate::data::store::{self, TabularStore};
use crate::data::table::Table;
use crate::{KaisenError, Result};
use serde_json::{Map, Value as Json};

const CREATURE_LIST_PATH: &str = "/pokemon";
const CREATURE_LIST_KEY: &str = "pokemons";
const CREATURE_DETAIL_PATH: &str = "/pokemon/{pokemon_id}";
const COMBAT_LIST_PATH: &str = "/combats";
const COMBAT_LIST_KEY: &str = "combats";

/// The three tables produced by one acquisition run
pub struct DatasetTables {
    pub creatures: Table,
    pub attributes: Table,
    pub combats: Table,
}

/// Run the full acquisition: creature list, per-creature detail, combat list.
///
/// An empty creature list is fatal (nothing downstream can work), but a
/// failed detail lookup or an empty combat list only degrades the run.
pub fn assemble(client: &ApiClient) -> Result<DatasetTables> {
    log::info!("Fetching creature list");
    let creature_records = client.fetch_paginated(CREATURE_LIST_PATH, CREATURE_LIST_KEY);
    if creature_records.is_empty() {
        return Err(KaisenError::EmptyDataset(
            "creature list fetch returned no records".to_string(),
        ));
    }
    let creatures = Table::from_records(&creature_records);

    let (id_column, identifiers) = resolve_identifiers(&creatures)?;
    log::info!("Using '{}' as the detail-lookup identifier", id_column);

    log::info!(
        "Fetching per-creature attributes ({} lookups)",
        identifiers.len()
    );
    let mut detail_records = Vec::new();
    for id in &identifiers {
        let path = CREATURE_DETAIL_PATH.replace("{pokemon_id}", id);
        match client.fetch_detail(&path) {
            Some(detail) => {
                let mut flat = flatten(&detail);
                flat.insert(format!("source_{}", id_column), Json::String(id.clone()));
                detail_records.push(Json::Object(flat));
            }
            None => log::warn!("Skipping attributes for '{}'", id),
        }
    }
    if detail_records.is_empty() {
        log::warn!("No attribute records could be fetched");
    }
    let attributes = Table::from_records(&detail_records);

    log::info!("Fetching combat list");
    let combat_records = client.fetch_paginated(COMBAT_LIST_PATH, COMBAT_LIST_KEY);
    if combat_records.is_empty() {
        log::warn!("No combat records could be fetched");
    }
    let combats = Table::from_records(&combat_records);

    log::info!(
        "Assembled {} creatures, {} attribute rows, {} combats",
        creatures.len(),
        attributes.len(),
        combats.len()
    );
    Ok(DatasetTables {
        creatures,
        attributes,
        combats,
    })
}

/// Write the three snapshots. Each write is independent: a failure is logged
/// and the remaining tables are still written.
pub fn write_snapshots(store: &TabularStore, tables: &DatasetTables) {
    let snapshots = [
        (store::CREATURE_LIST, &tables.creatures),
        (store::CREATURE_ATTRIBUTES, &tables.attributes),
        (store::COMBAT_LIST, &tables.combats),
    ];
    for (name, table) in snapshots {
        if let Err(e) = store.write(name, table) {
            log::error!("Failed to write '{}' snapshot: {}", name, e);
        }
    }
}

/// Pick the detail-lookup identifier column: 'id' preferred, 'name' as a
/// fallback, neither is fatal.
fn resolve_identifiers(creatures: &Table) -> Result<(&'static str, Vec<String>)> {
    let (column, idx) = if let Some(idx) = creatures.column("id") {
        ("id", idx)
    } else if let Some(idx) = creatures.column("name") {
        ("name", idx)
    } else {
        return Err(KaisenError::Schema {
            table: "creature list".to_string(),
            column: "id (or name)".to_string(),
        });
    };

    let identifiers = creatures
        .rows()
        .iter()
        .filter_map(|row| row[idx].key_string())
        .collect();
    Ok((column, identifiers))
}

/// Flatten a nested JSON record into dot-joined keys, one level of cells per
/// leaf. Arrays stay intact as single values.
fn flatten(value: &Json) -> Map<String, Json> {
    let mut out = Map::new();
    match value {
        Json::Object(_) => flatten_into(value, "", &mut out),
        other => {
            out.insert("value".to_string(), other.clone());
        }
    }
    out
}

fn flatten_into(value: &Json, prefix: &str, out: &mut Map<String, Json>) {
    match value {
        Json::Object(fields) => {
            for (key, nested) in fields {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(nested, &path, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_identifiers_prefers_id() {
        let table = Table::from_records(&[
            json!({"id": 1, "name": "bulbasaur"}),
            json!({"id": 2, "name": "ivysaur"}),
        ]);
        let (column, ids) = resolve_identifiers(&table).unwrap();
        assert_eq!(column, "id");
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_resolve_identifiers_falls_back_to_name() {
        let table = Table::from_records(&[json!({"name": "mewtwo"})]);
        let (column, ids) = resolve_identifiers(&table).unwrap();
        assert_eq!(column, "name");
        assert_eq!(ids, vec!["mewtwo"]);
    }

    #[test]
    fn test_resolve_identifiers_fails_without_either() {
        let table = Table::from_records(&[json!({"hp": 50})]);
        assert!(resolve_identifiers(&table).is_err());
    }

    #[test]
    fn test_flatten_nested_record() {
        let detail = json!({
            "id": 4,
            "stats": {"hp": 39, "attack": 52},
            "types": ["fire"]
        });
        let flat = flatten(&detail);

        assert_eq!(flat.get("id"), Some(&json!(4)));
        assert_eq!(flat.get("stats.hp"), Some(&json!(39)));
        assert_eq!(flat.get("stats.attack"), Some(&json!(52)));
        assert_eq!(flat.get("types"), Some(&json!(["fire"])));
    }

    #[test]
    fn test_flatten_scalar_record() {
        let flat = flatten(&json!(42));
        assert_eq!(flat.get("value"), Some(&json!(42)));
    }
}
