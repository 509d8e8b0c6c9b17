//! shardbind Router - Shard Key Routing
//!
//! Routes entities to one of N databases and one of M table shards within
//! it, and keeps each router pinned to the first pair it routes to.
//!
//! # Architecture
//!
//! ```text
//! Entity / ShardKey
//!     │
//!     ▼
//! ┌─────────────────────────┐
//! │    ShardKeyRegistry     │  Which field is the shard key?
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐
//! │      ShardRouter        │  Which database and table shard?
//! │  (bound once per scope) │
//! └───────────┬─────────────┘
//!             │
//!       ┌─────┴──────────────────┐
//!       ▼                        ▼
//! ┌───────────────────┐  ┌────────────────────┐
//! │ RoutingContext    │  │ SqlTemplateRewriter│
//! │ Factory           │  │ t_@index → t_03    │
//! └───────────────────┘  └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use shardbind_router::{ShardingRuntime, ShardingConfig};
//!
//! let runtime = ShardingRuntime::new(config, builder)?;
//!
//! // One router per request
//! let router = runtime.scope()?;
//! let ctx = runtime.context_for(&router, &order).await?;
//!
//! // Raw SQL goes to the same shard
//! runtime.execute_raw(&router, order.user_id, "select * from t_order_@index", &executor).await?;
//! ```

// Core modules
mod error;
mod registry;
mod template;

// Collaborator seams
mod context;
mod executor;

// Routers
mod router;
mod runtime;

// Re-exports: Error types
pub use error::{RouterError, RouterResult};

// Re-exports: Core types
pub use shardbind_core::{
    ConfigError, NegativeKeyPolicy, RoutingDecision, ShardKey, ShardingConfig,
    DEFAULT_PLACEHOLDER, DEFAULT_SHARD_COUNT, MAX_TABLE_SHARDS,
};

// Re-exports: Shard key resolution
pub use registry::{FieldDecl, ShardKeyRegistry, ShardedEntity};

// Re-exports: SQL templates
pub use template::{physical_table_name, table_suffix, SqlTemplateRewriter};

// Re-exports: Context and executor seams
pub use context::{ContextBuilder, ContextTarget, DataContext, RoutingContextFactory};
pub use executor::{RawOutcome, RawSqlExecutor};

// Re-exports: Routers
pub use router::ShardRouter;
pub use runtime::ShardingRuntime;
