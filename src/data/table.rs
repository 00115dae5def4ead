//! Rectangular tables with a header row and typed cells
//!
//! Every table the pipeline touches is an explicit schema (named columns) over
//! rows of loosely typed cells, so absent-column conditions surface as schema
//! errors instead of silent lookups.

use crate::{KaisenError, Result};
use serde_json::Value as Json;
use std::fmt;

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Convert a JSON value into a cell. Arrays and objects are kept as their
    /// JSON text rendition, which is how list-valued fields such as creature
    /// types land in a flat table.
    pub fn from_json(value: &Json) -> Cell {
        match value {
            Json::Null => Cell::Null,
            Json::Bool(b) => Cell::Int(*b as i64),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else {
                    Cell::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Parse a raw CSV field back into a typed cell.
    pub fn parse(raw: &str) -> Cell {
        if raw.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Cell::Float(f);
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Canonical join-key form. Integer and textual identifiers compare
    /// through the same representation, so a snapshot round trip cannot break
    /// a join.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A rectangular table: named columns over rows of cells
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a list of JSON objects. Columns are the union of
    /// object keys in first-seen order; a key absent from a record becomes a
    /// null cell. Non-object records are skipped with a warning.
    pub fn from_records(records: &[Json]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Json::Object(fields) = record {
                for key in fields.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Table::new(columns);
        for record in records {
            match record {
                Json::Object(fields) => {
                    let row = table
                        .columns
                        .iter()
                        .map(|col| fields.get(col).map(Cell::from_json).unwrap_or(Cell::Null))
                        .collect();
                    table.rows.push(row);
                }
                other => log::warn!("Skipping non-object record: {}", other),
            }
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a named column, or a schema error naming both the column and
    /// the table it was expected in.
    pub fn require_column(&self, table_name: &str, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| KaisenError::Schema {
            table: table_name.to_string(),
            column: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_union_of_keys() {
        let records = vec![
            json!({"id": 1, "name": "bulbasaur"}),
            json!({"id": 2, "hp": 60}),
        ];
        let table = Table::from_records(&records);

        assert_eq!(table.columns(), &["id", "name", "hp"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][2], Cell::Null);
        assert_eq!(table.rows()[1][1], Cell::Null);
        assert_eq!(table.rows()[1][2], Cell::Int(60));
    }

    #[test]
    fn test_from_records_serializes_lists() {
        let records = vec![json!({"id": 1, "types": ["fire", "flying"]})];
        let table = Table::from_records(&records);

        let types = table.column("types").unwrap();
        assert_eq!(
            table.rows()[0][types],
            Cell::Text("[\"fire\",\"flying\"]".to_string())
        );
    }

    #[test]
    fn test_require_column_names_table_and_column() {
        let table = Table::new(vec!["id".to_string()]);
        let err = table.require_column("attributes", "types").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("types"));
        assert!(message.contains("attributes"));
    }

    #[test]
    fn test_cell_parse_round_trip() {
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("42"), Cell::Int(42));
        assert_eq!(Cell::parse("4.5"), Cell::Float(4.5));
        assert_eq!(Cell::parse("pikachu"), Cell::Text("pikachu".to_string()));
    }

    #[test]
    fn test_key_string_matches_across_types() {
        assert_eq!(Cell::Int(7).key_string(), Cell::Text("7".to_string()).key_string());
        assert_eq!(Cell::Null.key_string(), None);
    }
}
