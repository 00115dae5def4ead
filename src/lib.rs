//! Combat analytics for the Kaisen creature-combat service
//!
//! Acquires the full combat dataset over the paginated Kaisen API, persists it
//! as flat CSV snapshots, and derives attribute-importance, per-type win-rate,
//! and leaderboard views from the stored tables.

pub mod analysis;
pub mod data;
pub mod oracle;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide errors
#[derive(Debug, Error)]
pub enum KaisenError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Column '{column}' not found in the {table} table")]
    Schema { table: String, column: String },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Ranking oracle error: {0}")]
    Oracle(String),

    #[error("Snapshot store error: {0}")]
    Store(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KaisenError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub data: DataConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
    /// Default minimum recorded fights for the roster leaderboard
    pub min_fights: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                username: String::new(),
                password: String::new(),
                timeout_secs: 30,
            },
            data: DataConfig {
                data_dir: "data".to_string(),
                min_fights: 20,
            },
            oracle: OracleConfig {
                epochs: 200,
                learning_rate: 0.1,
                seed: 42,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KaisenError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| KaisenError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KaisenError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables take precedence over the config file, so
    /// credentials never have to be written to disk.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("KAISEN_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(user) = std::env::var("KAISEN_API_USER") {
            self.api.username = user;
        }
        if let Ok(pass) = std::env::var("KAISEN_API_PASS") {
            self.api.password = pass;
        }
    }
}
