//! Sharding Runtime
//!
//! Holds what is shared across requests (configuration, shard key registry,
//! context factory, SQL rewriter) and hands out one fresh [`ShardRouter`]
//! per logical request.
//!
//! # Request Flow
//!
//! ```text
//! runtime.scope()
//!        │
//!        ▼
//! entity / key ──► registry (cold path) ──► router.route()
//!                                              │
//!                      ┌───────────────────────┴──────────┐
//!                      ▼                                  ▼
//!          factory.get_or_create()            rewriter + raw executor
//!                      │                                  │
//!                      ▼                                  ▼
//!               data context                    bound database
//! ```
//!
//! A [`RouterError::CrossShardBinding`] means one scope was asked to serve
//! two shard key domains; open another scope for the second domain.

use std::sync::Arc;
use tracing::info;

use crate::context::{ContextBuilder, RoutingContextFactory};
use crate::error::RouterResult;
use crate::executor::{RawOutcome, RawSqlExecutor};
use crate::registry::{ShardKeyRegistry, ShardedEntity};
use crate::router::ShardRouter;
use crate::template::SqlTemplateRewriter;
use shardbind_core::{ShardKey, ShardingConfig};

/// Process-level entry point for shard routing
pub struct ShardingRuntime<B: ContextBuilder> {
    config: Arc<ShardingConfig>,
    registry: Arc<ShardKeyRegistry>,
    factory: RoutingContextFactory<B>,
    rewriter: SqlTemplateRewriter,
}

impl<B: ContextBuilder> ShardingRuntime<B> {
    /// Create a runtime with its own registry
    pub fn new(config: ShardingConfig, builder: B) -> RouterResult<Self> {
        Self::with_registry(config, builder, Arc::new(ShardKeyRegistry::new()))
    }

    /// Create a runtime sharing an existing registry
    pub fn with_registry(
        config: ShardingConfig,
        builder: B,
        registry: Arc<ShardKeyRegistry>,
    ) -> RouterResult<Self> {
        config.validate()?;
        info!(
            databases = config.database_count(),
            shards = config.shard_count,
            negative_keys = %config.negative_keys,
            "Sharding runtime ready"
        );

        let rewriter = SqlTemplateRewriter::with_placeholder(config.placeholder.clone());
        Ok(Self {
            config: Arc::new(config),
            registry,
            factory: RoutingContextFactory::new(builder),
            rewriter,
        })
    }

    pub fn config(&self) -> &ShardingConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ShardKeyRegistry> {
        &self.registry
    }

    pub fn factory(&self) -> &RoutingContextFactory<B> {
        &self.factory
    }

    pub fn rewriter(&self) -> &SqlTemplateRewriter {
        &self.rewriter
    }

    /// Validate an entity type's shard key declaration up front
    pub fn register<E: ShardedEntity>(&self) -> RouterResult<&'static str> {
        self.registry.register::<E>()
    }

    /// A fresh, unbound router for one logical request
    pub fn scope(&self) -> RouterResult<ShardRouter<B::Context>> {
        ShardRouter::new(self.config.clone())
    }

    /// Data context for `key` on `router`
    pub async fn context(
        &self,
        router: &ShardRouter<B::Context>,
        key: ShardKey,
    ) -> RouterResult<Arc<B::Context>> {
        self.factory.get_or_create(router, key).await
    }

    /// Data context for the shard `entity` lives in
    pub async fn context_for<E: ShardedEntity>(
        &self,
        router: &ShardRouter<B::Context>,
        entity: &E,
    ) -> RouterResult<Arc<B::Context>> {
        router.route_entity(&self.registry, entity)?;
        self.factory.get_or_create(router, entity.shard_key()).await
    }

    /// Rewrite and run raw SQL for `key` on `router`
    pub async fn execute_raw<E>(
        &self,
        router: &ShardRouter<B::Context>,
        key: ShardKey,
        sql: &str,
        executor: &E,
    ) -> RouterResult<RawOutcome>
    where
        E: RawSqlExecutor + ?Sized,
    {
        router.execute_raw(key, sql, &self.rewriter, executor).await
    }
}
