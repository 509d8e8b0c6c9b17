//! Raw SQL executor seam
//!
//! The router never talks to a database itself. It hands the bound
//! connection string and rewritten SQL to a [`RawSqlExecutor`], which owns
//! connection acquisition and release for the duration of one call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of one raw SQL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawOutcome {
    /// Rows returned by a query, one JSON object per row
    Rows(Vec<serde_json::Value>),
    /// Rows affected by a write
    Affected(u64),
}

impl RawOutcome {
    /// Returned rows, empty for writes
    pub fn rows(&self) -> &[serde_json::Value] {
        match self {
            RawOutcome::Rows(rows) => rows,
            RawOutcome::Affected(_) => &[],
        }
    }

    /// Affected row count; for queries, the number of rows returned
    pub fn affected(&self) -> u64 {
        match self {
            RawOutcome::Rows(rows) => rows.len() as u64,
            RawOutcome::Affected(n) => *n,
        }
    }
}

/// Executes raw SQL against one database
#[async_trait]
pub trait RawSqlExecutor: Send + Sync {
    /// Run `sql` on the database behind `connection`
    ///
    /// The connection must be released before returning, on error paths too.
    async fn execute(&self, connection: &str, sql: &str) -> anyhow::Result<RawOutcome>;
}
