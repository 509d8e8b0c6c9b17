//! Error types for the router module

use shardbind_core::{ConfigError, RoutingDecision, ShardKey};
use thiserror::Error;
use uuid::Uuid;

/// Router error types
#[derive(Debug, Error)]
pub enum RouterError {
    /// Missing or ambiguous shard-key field, or unusable counts
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A routing decision disagrees with the router's committed binding
    #[error("Key {key} routes to {attempted} but this router is bound to {bound}; use a separate router per shard key domain")]
    CrossShardBinding {
        bound: RoutingDecision,
        attempted: RoutingDecision,
        key: ShardKey,
    },

    /// The data context builder failed
    #[error("Failed to initialize data context for key {key}: {source}")]
    ContextInitialization {
        key: ShardKey,
        #[source]
        source: anyhow::Error,
    },

    /// Raw SQL does not carry the table-shard placeholder, or the index cannot be formatted
    #[error("Invalid SQL template: {0}")]
    Template(String),

    /// The router has been disposed
    #[error("Router {router} has been disposed")]
    UseAfterDispose { router: Uuid },

    /// Negative key under the reject policy
    #[error("Negative shard key {key} is not accepted")]
    InvalidShardKey { key: ShardKey },

    /// The raw SQL executor failed
    #[error("Raw SQL execution failed: {0}")]
    Execution(#[source] anyhow::Error),
}

impl RouterError {
    /// Whether the same operation can succeed on a freshly scoped router
    pub fn is_retryable_on_new_scope(&self) -> bool {
        matches!(
            self,
            RouterError::CrossShardBinding { .. } | RouterError::UseAfterDispose { .. }
        )
    }
}

impl From<ConfigError> for RouterError {
    fn from(err: ConfigError) -> Self {
        RouterError::Configuration(err.to_string())
    }
}

/// Result alias for router operations
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_shard_message_names_both_bindings() {
        let err = RouterError::CrossShardBinding {
            bound: RoutingDecision::new(1, 1),
            attempted: RoutingDecision::new(0, 2),
            key: 206,
        };
        let msg = err.to_string();
        assert!(msg.contains("db1/t01"), "{}", msg);
        assert!(msg.contains("db0/t02"), "{}", msg);
        assert!(msg.contains("206"), "{}", msg);
        assert!(err.is_retryable_on_new_scope());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: RouterError = ConfigError::NoDatabases.into();
        assert!(matches!(err, RouterError::Configuration(_)));
        assert!(!err.is_retryable_on_new_scope());
    }
}
