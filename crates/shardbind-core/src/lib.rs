//! shardbind core - Shared configuration and routing types
//!
//! This crate provides the pieces both the router and its callers need:
//! the sharding configuration and the routing decision types.

pub mod config;
pub mod types;

pub use config::{ConfigError, ShardingConfig};
pub use types::{
    NegativeKeyPolicy, RoutingDecision, ShardKey,
    DEFAULT_PLACEHOLDER, DEFAULT_SHARD_COUNT, MAX_TABLE_SHARDS,
};
