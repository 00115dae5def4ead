//! Analytical views over the stored combat dataset
//!
//! Three independent consumers of the combat and attribute snapshots:
//! attribute importance, per-type win rate, and the dream-team roster. Each
//! is a pure function of its input tables.

pub mod importance;
pub mod roster;
pub mod types;
pub mod win_rate;

pub use win_rate::{fight_stats, FightStats};

/// Identifier column used to correlate combat participants with attribute rows
pub const JOIN_KEY: &str = "id";

/// The canonical numeric attributes; each one may be absent from a dataset
pub const STAT_COLUMNS: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "sp_attack",
    "sp_defense",
    "speed",
];

/// Combat table column names
pub const FIRST_SLOT: &str = "first_pokemon";
pub const SECOND_SLOT: &str = "second_pokemon";
pub const WINNER: &str = "winner";

/// Attribute table column holding the (possibly text-encoded) type-tag list
pub const TYPES_COLUMN: &str = "types";
