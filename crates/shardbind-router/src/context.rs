//! Routing context construction
//!
//! Each router owns at most one data context, built for the (database,
//! table shard) pair it is bound to. Construction is delegated to a
//! [`ContextBuilder`] and happens at most once per router, however many
//! callers race on first use.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{RouterError, RouterResult};
use crate::router::ShardRouter;
use crate::template::physical_table_name;
use shardbind_core::{RoutingDecision, ShardKey};

/// What a data context is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTarget {
    /// Connection string of the selected database
    pub connection: String,
    pub decision: RoutingDecision,
    /// Key whose routing triggered construction
    pub key: ShardKey,
}

impl ContextTarget {
    /// Physical name of `logical` in this target's table shard
    pub fn table_name(&self, logical: &str) -> RouterResult<String> {
        physical_table_name(logical, self.decision.table_index)
    }
}

/// A data access context bound to one (database, table shard) pair
pub trait DataContext: Send + Sync + 'static {
    /// Release held resources (connections, pools)
    ///
    /// May be called more than once when disposal races with construction,
    /// so implementations must tolerate repeated calls.
    fn release(&self);
}

/// Builds data contexts for routing targets
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    type Context: DataContext;

    async fn build(&self, target: &ContextTarget) -> anyhow::Result<Self::Context>;
}

/// Lazily materializes the single data context of a router
pub struct RoutingContextFactory<B: ContextBuilder> {
    builder: B,
    /// Successful constructions across all routers
    constructed: AtomicU64,
}

impl<B: ContextBuilder> RoutingContextFactory<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            constructed: AtomicU64::new(0),
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Number of contexts built so far
    pub fn constructed(&self) -> u64 {
        self.constructed.load(Ordering::Relaxed)
    }

    /// Route `key` on `router` and return its context, building it on first use
    ///
    /// Fails with [`RouterError::CrossShardBinding`] if `key` disagrees with the
    /// router's binding. A failed build leaves the router without a context, so
    /// a later call builds again.
    pub async fn get_or_create(
        &self,
        router: &ShardRouter<B::Context>,
        key: ShardKey,
    ) -> RouterResult<Arc<B::Context>> {
        let decision = router.route(key)?;

        if let Some(ctx) = router.context_cell().get() {
            return Ok(ctx.clone());
        }

        let target = ContextTarget {
            connection: router.connection_for(decision)?.to_string(),
            decision,
            key,
        };

        let ctx = router
            .context_cell()
            .get_or_try_init(|| async move {
                debug!(
                    router = %router.id(),
                    key,
                    db_index = decision.db_index,
                    table_index = decision.table_index,
                    "Building data context"
                );
                let built = self
                    .builder
                    .build(&target)
                    .await
                    .map_err(|source| RouterError::ContextInitialization { key, source })?;
                self.constructed.fetch_add(1, Ordering::Relaxed);
                Ok::<_, RouterError>(Arc::new(built))
            })
            .await
            .map_err(|e| {
                warn!(router = %router.id(), key, error = %e, "Data context construction failed");
                e
            })?
            .clone();

        // Disposal may have run while the build was in flight and missed it
        if router.is_disposed() {
            router.release_context();
            return Err(RouterError::UseAfterDispose { router: router.id() });
        }

        Ok(ctx)
    }
}
