//! Common routing types
//!
//! Shared by the configuration layer and the router so both agree on how a
//! shard key maps onto database and table indices.

use serde::{Deserialize, Serialize};

/// Raw shard key value supplied by the caller
pub type ShardKey = i64;

/// Hard upper bound on table shards; suffixes are two decimal digits
pub const MAX_TABLE_SHARDS: u32 = 100;

/// Default number of table shards per database
pub const DEFAULT_SHARD_COUNT: u32 = 4;

/// Placeholder expanded to the table-shard suffix in raw SQL
pub const DEFAULT_PLACEHOLDER: &str = "@index";

/// (database, table-shard) pair a key routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Index into the ordered database connection list
    pub db_index: usize,
    /// Table partition within that database
    pub table_index: usize,
}

impl RoutingDecision {
    pub fn new(db_index: usize, table_index: usize) -> Self {
        Self { db_index, table_index }
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "db{}/t{:02}", self.db_index, self.table_index)
    }
}

/// How negative shard keys are treated
///
/// Native `%` keeps the sign of the dividend, so `-3 % 4 == -3`. Neither
/// variant ever lets that leak into an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeKeyPolicy {
    /// Negative keys are refused
    #[default]
    Reject,
    /// Floored modulo: `-3` over 4 shards lands on shard 1
    Normalize,
}

impl NegativeKeyPolicy {
    /// Reduce `key` into `0..modulus`.
    ///
    /// Returns `None` when the key is negative and the policy rejects it,
    /// and for a zero modulus.
    pub fn reduce(&self, key: ShardKey, modulus: u32) -> Option<usize> {
        if modulus == 0 {
            return None;
        }
        let modulus = i64::from(modulus);
        match self {
            NegativeKeyPolicy::Reject if key < 0 => None,
            NegativeKeyPolicy::Reject => Some((key % modulus) as usize),
            NegativeKeyPolicy::Normalize => Some(key.rem_euclid(modulus) as usize),
        }
    }
}

impl std::str::FromStr for NegativeKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(NegativeKeyPolicy::Reject),
            "normalize" => Ok(NegativeKeyPolicy::Normalize),
            other => Err(format!("unknown negative key policy '{}'", other)),
        }
    }
}

impl std::fmt::Display for NegativeKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegativeKeyPolicy::Reject => write!(f, "reject"),
            NegativeKeyPolicy::Normalize => write!(f, "normalize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_positive_keys() {
        let policy = NegativeKeyPolicy::Reject;
        assert_eq!(policy.reduce(101, 4), Some(1));
        assert_eq!(policy.reduce(101, 2), Some(1));
        assert_eq!(policy.reduce(0, 7), Some(0));
        assert_eq!(policy.reduce(i64::MAX, 100), Some(7));
    }

    #[test]
    fn test_reject_negative() {
        assert_eq!(NegativeKeyPolicy::Reject.reduce(-1, 4), None);
        assert_eq!(NegativeKeyPolicy::Reject.reduce(i64::MIN, 4), None);
    }

    #[test]
    fn test_normalize_uses_floored_modulo() {
        let policy = NegativeKeyPolicy::Normalize;
        assert_eq!(policy.reduce(-3, 4), Some(1));
        assert_eq!(policy.reduce(-4, 4), Some(0));
        assert_eq!(policy.reduce(-1, 2), Some(1));
        assert_eq!(policy.reduce(i64::MIN, 3), Some(1));
        // Same as native modulo for non-negative keys
        assert_eq!(policy.reduce(206, 4), Some(2));
    }

    #[test]
    fn test_zero_modulus() {
        assert_eq!(NegativeKeyPolicy::Reject.reduce(101, 0), None);
        assert_eq!(NegativeKeyPolicy::Normalize.reduce(-3, 0), None);
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(RoutingDecision::new(1, 2).to_string(), "db1/t02");
        assert_eq!(RoutingDecision::new(0, 42).to_string(), "db0/t42");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Normalize".parse::<NegativeKeyPolicy>(), Ok(NegativeKeyPolicy::Normalize));
        assert_eq!(" reject ".parse::<NegativeKeyPolicy>(), Ok(NegativeKeyPolicy::Reject));
        assert!("floor".parse::<NegativeKeyPolicy>().is_err());
    }
}
