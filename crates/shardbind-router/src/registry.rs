//! Shard Key Registry
//!
//! Resolves which field of an entity type carries its shard key. Entity
//! types declare their fields through [`ShardedEntity`]; the registry checks
//! that exactly one of them is marked as the shard key and caches the answer
//! by type identity.
//!
//! Entries are write-once: the first successful registration wins and is
//! never replaced. Concurrent cold lookups may each compute the field name,
//! which is harmless because the computation only reads static declarations.

use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::error::{RouterError, RouterResult};
use shardbind_core::ShardKey;

/// Declared metadata for one entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    /// Whether this field is the sharding discriminator
    pub shard_key: bool,
}

impl FieldDecl {
    /// A plain field
    pub const fn plain(name: &'static str) -> Self {
        Self { name, shard_key: false }
    }

    /// The shard key field
    pub const fn shard_key(name: &'static str) -> Self {
        Self { name, shard_key: true }
    }
}

/// An entity type whose rows are spread over sharded tables
pub trait ShardedEntity: 'static {
    /// Field declarations; exactly one must be marked as the shard key
    const FIELDS: &'static [FieldDecl];

    /// Value of the shard key field for this instance
    fn shard_key(&self) -> ShardKey;
}

/// Process-wide cache of entity type → shard key field name
#[derive(Debug, Default)]
pub struct ShardKeyRegistry {
    fields: RwLock<HashMap<TypeId, &'static str>>,
}

impl ShardKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `E`'s declarations and cache its shard key field
    pub fn register<E: ShardedEntity>(&self) -> RouterResult<&'static str> {
        let field = Self::discover::<E>()?;

        let mut fields = self.fields.write();
        let stored = *fields.entry(TypeId::of::<E>()).or_insert(field);
        debug!(entity = type_name::<E>(), field = stored, "Registered shard key field");
        Ok(stored)
    }

    /// Shard key field for `E`, registering it on first use
    pub fn resolve<E: ShardedEntity>(&self) -> RouterResult<&'static str> {
        if let Some(field) = self.fields.read().get(&TypeId::of::<E>()) {
            trace!(entity = type_name::<E>(), field = *field, "Shard key field cache hit");
            return Ok(*field);
        }
        self.register::<E>()
    }

    /// Whether `E` has been registered
    pub fn is_registered<E: ShardedEntity>(&self) -> bool {
        self.fields.read().contains_key(&TypeId::of::<E>())
    }

    /// Number of registered entity types
    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    /// Find the single field `E` marks as its shard key
    fn discover<E: ShardedEntity>() -> RouterResult<&'static str> {
        let marked: Vec<&'static str> = E::FIELDS
            .iter()
            .filter(|f| f.shard_key)
            .map(|f| f.name)
            .collect();

        match marked.as_slice() {
            [field] => Ok(*field),
            [] => Err(RouterError::Configuration(format!(
                "entity {} declares no shard key field",
                type_name::<E>()
            ))),
            many => Err(RouterError::Configuration(format!(
                "entity {} declares {} shard key fields ({}), expected exactly one",
                type_name::<E>(),
                many.len(),
                many.join(", ")
            ))),
        }
    }
}
