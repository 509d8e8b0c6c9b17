//! SQL template rewriting
//!
//! Raw SQL against sharded tables must name the table family with a
//! placeholder (`t_order_@index`), which is expanded to the two-digit
//! table-shard suffix of the router's binding. SQL without the placeholder
//! is refused so it can never hit an unsharded table name by accident.

use tracing::trace;

use crate::error::{RouterError, RouterResult};
use shardbind_core::{DEFAULT_PLACEHOLDER, MAX_TABLE_SHARDS};

/// Two-digit suffix for a table shard index
///
/// Indices of 100 and above have no two-digit form and are rejected.
pub fn table_suffix(table_index: usize) -> RouterResult<String> {
    if table_index >= MAX_TABLE_SHARDS as usize {
        return Err(RouterError::Template(format!(
            "table index {} exceeds the two-digit suffix limit of {}",
            table_index,
            MAX_TABLE_SHARDS - 1
        )));
    }
    Ok(format!("{:02}", table_index))
}

/// Physical table name for a logical table and shard index, e.g. `t_order_03`
pub fn physical_table_name(logical: &str, table_index: usize) -> RouterResult<String> {
    Ok(format!("{}_{}", logical, table_suffix(table_index)?))
}

/// Expands the table-shard placeholder in raw SQL
#[derive(Debug, Clone)]
pub struct SqlTemplateRewriter {
    placeholder: String,
}

impl SqlTemplateRewriter {
    /// Rewriter for the default `@index` placeholder
    pub fn new() -> Self {
        Self::with_placeholder(DEFAULT_PLACEHOLDER)
    }

    /// Rewriter for a custom placeholder token
    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        Self { placeholder: placeholder.into() }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Fail unless `raw_sql` carries the placeholder
    pub fn check(&self, raw_sql: &str) -> RouterResult<()> {
        if self.placeholder.is_empty() || !raw_sql.contains(&self.placeholder) {
            return Err(RouterError::Template(format!(
                "SQL does not contain the table shard placeholder '{}'",
                self.placeholder
            )));
        }
        Ok(())
    }

    /// Replace every placeholder occurrence with the table index suffix
    pub fn rewrite(&self, raw_sql: &str, table_index: usize) -> RouterResult<String> {
        self.check(raw_sql)?;
        let suffix = table_suffix(table_index)?;
        let sql = raw_sql.replace(&self.placeholder, &suffix);
        trace!(table_index, sql = %sql, "Rewrote SQL template");
        Ok(sql)
    }
}

impl Default for SqlTemplateRewriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_example() {
        let rewriter = SqlTemplateRewriter::new();
        let sql = rewriter.rewrite("select * from t_@index", 1).unwrap();
        assert_eq!(sql, "select * from t_01");
    }

    #[test]
    fn test_rewrite_all_occurrences() {
        let rewriter = SqlTemplateRewriter::new();
        let sql = rewriter
            .rewrite(
                "update t_order_@index set state = 1 where id in (select id from t_item_@index)",
                42,
            )
            .unwrap();
        assert_eq!(
            sql,
            "update t_order_42 set state = 1 where id in (select id from t_item_42)"
        );
    }

    #[test]
    fn test_missing_placeholder() {
        let rewriter = SqlTemplateRewriter::new();
        let result = rewriter.rewrite("select * from t_order", 1);
        assert!(matches!(result, Err(RouterError::Template(_))));
    }

    #[test]
    fn test_rewrite_is_single_pass() {
        let rewriter = SqlTemplateRewriter::new();
        let once = rewriter.rewrite("delete from t_@index where id = 9", 3).unwrap();
        assert!(matches!(rewriter.rewrite(&once, 3), Err(RouterError::Template(_))));
    }

    #[test]
    fn test_check_placeholder() {
        let rewriter = SqlTemplateRewriter::new();
        assert!(rewriter.check("select * from t_order_@index").is_ok());
        assert!(matches!(rewriter.check("select * from t_order"), Err(RouterError::Template(_))));
    }

    #[test]
    fn test_index_limit() {
        let rewriter = SqlTemplateRewriter::new();
        assert_eq!(rewriter.rewrite("t_@index", 99).unwrap(), "t_99");
        assert!(matches!(rewriter.rewrite("t_@index", 100), Err(RouterError::Template(_))));
    }

    #[test]
    fn test_custom_placeholder() {
        let rewriter = SqlTemplateRewriter::with_placeholder("{shard}");
        assert_eq!(rewriter.placeholder(), "{shard}");
        assert_eq!(rewriter.rewrite("select 1 from log_{shard}", 0).unwrap(), "select 1 from log_00");
        assert!(rewriter.rewrite("select 1 from log_@index", 0).is_err());
    }

    #[test]
    fn test_physical_table_name() {
        assert_eq!(physical_table_name("t_order", 3).unwrap(), "t_order_03");
        assert_eq!(table_suffix(10).unwrap(), "10");
        assert!(physical_table_name("t_order", 250).is_err());
    }
}
