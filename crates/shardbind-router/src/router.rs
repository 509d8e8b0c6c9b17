//! Shard Router
//!
//! Maps a shard key onto a (database, table shard) pair and pins the router
//! to the first pair it produces.
//!
//! # Binding
//!
//! ```text
//! route(key)
//!     │
//!     ▼
//! (key mod databases, key mod shards)
//!     │
//!     ▼
//! Bound? ──No──► bind, return decision
//!     │
//!    Yes
//!     │
//!     ▼
//! Same pair? ──Yes──► return decision
//!     │
//!     No
//!     ▼
//! CrossShardBinding
//! ```
//!
//! A router is meant to live for one logical request. Mixing keys from
//! different shard domains on one router is a caller bug and fails loudly
//! instead of silently writing to a second database or table.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::context::DataContext;
use crate::error::{RouterError, RouterResult};
use crate::executor::{RawOutcome, RawSqlExecutor};
use crate::registry::{ShardKeyRegistry, ShardedEntity};
use crate::template::SqlTemplateRewriter;
use shardbind_core::{RoutingDecision, ShardKey, ShardingConfig};

/// Routes shard keys and enforces a single binding for its lifetime
pub struct ShardRouter<C: DataContext> {
    /// Scope id used in logs and errors
    id: Uuid,

    config: Arc<ShardingConfig>,

    /// `None` until the first successful route
    binding: Mutex<Option<RoutingDecision>>,

    /// Data context for the binding, built at most once
    context: OnceCell<Arc<C>>,

    disposed: AtomicBool,

    /// Set by whichever of dispose or a late build releases the context
    released: AtomicBool,
}

impl<C: DataContext> ShardRouter<C> {
    /// Create an unbound router over a validated configuration
    pub fn new(config: Arc<ShardingConfig>) -> RouterResult<Self> {
        config.validate()?;
        let id = Uuid::new_v4();
        trace!(router = %id, databases = config.database_count(), shards = config.shard_count, "Created shard router");
        Ok(Self {
            id,
            config,
            binding: Mutex::new(None),
            context: OnceCell::new(),
            disposed: AtomicBool::new(false),
            released: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ShardingConfig {
        &self.config
    }

    /// Compute the decision for `key` without touching the binding
    pub fn decide(&self, key: ShardKey) -> RouterResult<RoutingDecision> {
        let policy = self.config.negative_keys;
        let invalid = move || RouterError::InvalidShardKey { key };

        let table_index = policy.reduce(key, self.config.shard_count).ok_or_else(invalid)?;
        let database_count = u32::try_from(self.config.database_count())
            .map_err(|_| RouterError::Configuration("too many databases".to_string()))?;
        let db_index = policy.reduce(key, database_count).ok_or_else(invalid)?;

        Ok(RoutingDecision::new(db_index, table_index))
    }

    /// Route `key`, binding the router on first use
    ///
    /// Later calls must reproduce the bound pair or fail with
    /// [`RouterError::CrossShardBinding`]; the binding is never changed by a
    /// failed call.
    pub fn route(&self, key: ShardKey) -> RouterResult<RoutingDecision> {
        self.ensure_live()?;
        let attempted = self.decide(key)?;

        let mut binding = self.binding.lock();
        // Disposal flips the flag under this lock, so no binding lands after it
        self.ensure_live()?;
        match *binding {
            None => {
                *binding = Some(attempted);
                debug!(
                    router = %self.id,
                    key,
                    db_index = attempted.db_index,
                    table_index = attempted.table_index,
                    "Router bound"
                );
                Ok(attempted)
            }
            Some(bound) if bound == attempted => Ok(bound),
            Some(bound) => {
                warn!(
                    router = %self.id,
                    key,
                    bound = %bound,
                    attempted = %attempted,
                    "Rejected cross-shard route"
                );
                Err(RouterError::CrossShardBinding { bound, attempted, key })
            }
        }
    }

    /// Route an entity by its declared shard key field
    pub fn route_entity<E: ShardedEntity>(
        &self,
        registry: &ShardKeyRegistry,
        entity: &E,
    ) -> RouterResult<RoutingDecision> {
        let field = registry.resolve::<E>()?;
        let key = entity.shard_key();
        trace!(router = %self.id, entity = std::any::type_name::<E>(), field, key, "Routing entity");
        self.route(key)
    }

    /// The committed binding, if any
    pub fn binding(&self) -> Option<RoutingDecision> {
        *self.binding.lock()
    }

    pub fn is_bound(&self) -> bool {
        self.binding().is_some()
    }

    /// Connection string of the bound database
    pub fn connection_string(&self) -> Option<&str> {
        let decision = self.binding()?;
        self.config.databases.get(decision.db_index).map(String::as_str)
    }

    /// The data context, if one has been built and not yet released
    pub fn context(&self) -> Option<Arc<C>> {
        if self.is_disposed() {
            return None;
        }
        self.context.get().cloned()
    }

    /// Route `key`, rewrite `sql` for the bound table shard and run it
    ///
    /// SQL without the placeholder fails before the router is bound. No
    /// router lock is held while the executor runs.
    pub async fn execute_raw<E>(
        &self,
        key: ShardKey,
        sql: &str,
        rewriter: &SqlTemplateRewriter,
        executor: &E,
    ) -> RouterResult<RawOutcome>
    where
        E: RawSqlExecutor + ?Sized,
    {
        rewriter.check(sql)?;
        let decision = self.route(key)?;
        let sql = rewriter.rewrite(sql, decision.table_index)?;
        let connection = self.connection_for(decision)?;

        debug!(router = %self.id, key, binding = %decision, "Executing raw SQL");
        executor
            .execute(connection, &sql)
            .await
            .map_err(RouterError::Execution)
    }

    /// Release the data context and refuse further operations
    ///
    /// Idempotent; only the first call releases anything.
    pub fn dispose(&self) {
        let binding = {
            let binding = self.binding.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            *binding
        };
        self.release_context();
        debug!(router = %self.id, binding = ?binding, "Router disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the built context at most once
    pub(crate) fn release_context(&self) {
        if let Some(ctx) = self.context.get() {
            if !self.released.swap(true, Ordering::AcqRel) {
                ctx.release();
            }
        }
    }

    pub(crate) fn context_cell(&self) -> &OnceCell<Arc<C>> {
        &self.context
    }

    pub(crate) fn connection_for(&self, decision: RoutingDecision) -> RouterResult<&str> {
        self.config
            .databases
            .get(decision.db_index)
            .map(String::as_str)
            .ok_or_else(|| {
                RouterError::Configuration(format!("no database at index {}", decision.db_index))
            })
    }

    fn ensure_live(&self) -> RouterResult<()> {
        if self.is_disposed() {
            return Err(RouterError::UseAfterDispose { router: self.id });
        }
        Ok(())
    }
}

impl<C: DataContext> Drop for ShardRouter<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<C: DataContext> std::fmt::Debug for ShardRouter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardRouter")
            .field("id", &self.id)
            .field("binding", &self.binding())
            .field("has_context", &self.context.initialized())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
