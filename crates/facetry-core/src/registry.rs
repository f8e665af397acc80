//! Process-wide schema registry keyed by document type.
//!
//! Schemas are resolved lazily, once per document type, and then live for
//! the rest of the process as `&'static Schema`. Lookups after the first
//! success take a shared read lock only.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::error::Result;
use crate::facet_spec::DEFAULT_FACET_COUNT;
use crate::schema::{FieldDescriptor, Schema};

/// A document type that can be searched.
///
/// Implementations are usually generated from field attributes; Facetry only
/// consumes the resolved descriptor list.
pub trait Searchable: 'static {
    /// Ordered field descriptors for this document type.
    ///
    /// Must not call [`schema_of`] for the same type.
    fn fields() -> Vec<FieldDescriptor>;

    /// Bucket count for facetable fields that do not carry a facet spec.
    fn default_facet_count() -> u32 {
        DEFAULT_FACET_COUNT
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<TypeId, &'static Schema>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolved schema for `T`, building and caching it on first use.
///
/// Construction runs at most once per type after it first succeeds. A
/// failed construction is not cached, so the error is reported again on the
/// next call.
///
/// # Errors
///
/// Returns the configuration error raised by [`Schema::new`].
pub fn schema_of<T: Searchable>() -> Result<&'static Schema> {
    let id = TypeId::of::<T>();

    if let Some(schema) = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
    {
        return Ok(schema);
    }

    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have won the race for the write lock.
    if let Some(schema) = registry.get(&id).copied() {
        return Ok(schema);
    }

    let schema = Schema::with_default_facet_count(T::fields(), T::default_facet_count())?;
    let schema: &'static Schema = Box::leak(Box::new(schema));
    registry.insert(id, schema);
    log::debug!("Registered search schema for {}", type_name::<T>());
    Ok(schema)
}

// ============================================================================
// Tests
// ============================================================================
