//! Configuration module for shard routing

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::{NegativeKeyPolicy, DEFAULT_PLACEHOLDER, DEFAULT_SHARD_COUNT, MAX_TABLE_SHARDS};

/// Configuration error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No database connection strings configured
    #[error("At least one database connection string is required")]
    NoDatabases,

    /// A connection string is empty or whitespace
    #[error("Database connection string at position {0} is blank")]
    BlankConnection(usize),

    /// Shard count outside 1..=MAX_TABLE_SHARDS
    #[error("Shard count must be between 1 and {max}, got {got}")]
    ShardCount { got: u32, max: u32 },

    /// Placeholder token is empty
    #[error("SQL placeholder token must not be empty")]
    EmptyPlaceholder,

    /// Malformed JSON or environment value
    #[error("Invalid configuration value: {0}")]
    Parse(String),
}

/// Sharding configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardingConfig {
    /// Ordered database connection strings; position is the database index
    pub databases: Vec<String>,

    /// Table shards per database
    pub shard_count: u32,

    /// Treatment of negative shard keys
    pub negative_keys: NegativeKeyPolicy,

    /// Token expanded to the table-shard suffix in raw SQL
    pub placeholder: String,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            databases: vec![],
            shard_count: DEFAULT_SHARD_COUNT,
            negative_keys: NegativeKeyPolicy::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl ShardingConfig {
    /// Create a config over the given databases and table shard count
    pub fn new(databases: Vec<String>, shard_count: u32) -> Self {
        Self {
            databases,
            shard_count,
            ..Self::default()
        }
    }

    /// Set the negative key policy
    pub fn with_negative_keys(mut self, policy: NegativeKeyPolicy) -> Self {
        self.negative_keys = policy;
        self
    }

    /// Set the SQL placeholder token
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Number of configured databases
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    /// Load configuration from environment variables
    ///
    /// Unparseable values are logged and the default is kept;
    /// [`validate`](Self::validate) catches anything still unusable.
    pub fn from_env() -> Self {
        let mut config = ShardingConfig::default();

        if let Ok(databases) = std::env::var("SHARDBIND_DATABASES") {
            config.databases = databases
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(count) = std::env::var("SHARDBIND_SHARD_COUNT") {
            match count.trim().parse() {
                Ok(count) => config.shard_count = count,
                Err(_) => warn!(value = %count, "Ignoring unparseable SHARDBIND_SHARD_COUNT"),
            }
        }

        if let Ok(policy) = std::env::var("SHARDBIND_NEGATIVE_KEYS") {
            match policy.parse() {
                Ok(policy) => config.negative_keys = policy,
                Err(e) => warn!(error = %e, "Ignoring SHARDBIND_NEGATIVE_KEYS"),
            }
        }

        if let Ok(placeholder) = std::env::var("SHARDBIND_PLACEHOLDER") {
            config.placeholder = placeholder;
        }

        config
    }

    /// Parse configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the invariants the router relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.databases.is_empty() {
            return Err(ConfigError::NoDatabases);
        }
        if let Some(pos) = self.databases.iter().position(|db| db.trim().is_empty()) {
            return Err(ConfigError::BlankConnection(pos));
        }
        if self.shard_count == 0 || self.shard_count > MAX_TABLE_SHARDS {
            return Err(ConfigError::ShardCount {
                got: self.shard_count,
                max: MAX_TABLE_SHARDS,
            });
        }
        if self.placeholder.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }
        Ok(())
    }
}
