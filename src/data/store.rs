//! CSV snapshot store
//!
//! Persists the three dataset tables as flat CSV files with a header row.
//! Reads and writes are all-or-nothing per table.

use crate::data::table::{Cell, Table};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const CREATURE_LIST: &str = "pokemon_list";
pub const CREATURE_ATTRIBUTES: &str = "pokemon_attributes";
pub const COMBAT_LIST: &str = "combat_list";

/// Directory-backed store of named table snapshots
pub struct TabularStore {
    dir: PathBuf,
}

impl TabularStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        TabularStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    pub fn write(&self, name: &str, table: &Table) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;

        log::info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    pub fn read(&self, name: &str) -> Result<Table> {
        let mut reader = csv::Reader::from_path(self.path(name))?;
        let columns = reader.headers()?.iter().map(str::to_string).collect();

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(Cell::parse).collect());
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_preserves_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = TabularStore::new(dir.path());

        let table = Table::from_records(&[
            json!({"id": 1, "name": "charmander", "types": ["fire"], "hp": 39}),
            json!({"id": 7, "name": "squirtle", "types": ["water"], "hp": 44}),
        ]);
        store.write(CREATURE_ATTRIBUTES, &table).unwrap();

        let loaded = store.read(CREATURE_ATTRIBUTES).unwrap();
        assert_eq!(loaded.len(), table.len());
        assert_eq!(loaded.columns(), table.columns());

        let id = loaded.column("id").unwrap();
        assert_eq!(loaded.rows()[0][id], Cell::Int(1));
        let types = loaded.column("types").unwrap();
        assert_eq!(
            loaded.rows()[1][types],
            Cell::Text("[\"water\"]".to_string())
        );
    }

    #[test]
    fn test_round_trip_keeps_null_cells() {
        let dir = tempfile::tempdir().unwrap();
        let store = TabularStore::new(dir.path());

        let table = Table::from_records(&[json!({"id": 1}), json!({"id": 2, "hp": 60})]);
        store.write(CREATURE_LIST, &table).unwrap();

        let loaded = store.read(CREATURE_LIST).unwrap();
        let hp = loaded.column("hp").unwrap();
        assert_eq!(loaded.rows()[0][hp], Cell::Null);
        assert_eq!(loaded.rows()[1][hp], Cell::Int(60));
    }

    #[test]
    fn test_read_missing_snapshot_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = TabularStore::new(dir.path());
        assert!(store.read(COMBAT_LIST).is_err());
        assert!(!store.exists(COMBAT_LIST));
    }
}
