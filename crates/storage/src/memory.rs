//! MemoryStore: reference in-memory backend
//!
//! This module implements the Store contract using:
//! - `BTreeMap<Resource, ValuesObject>` for the records
//! - an [`EntityIndex`] for entity-scoped scans
//! - a single `parking_lot::RwLock` over both
//!
//! # Isolation
//!
//! - `exists` and `exist_all` run under one read guard, so a batch check
//!   observes a single consistent snapshot.
//! - `create` and `edit` validate under the write guard, so the references
//!   they check cannot be deleted between validation and the write.
//! - Deletes do not cascade: references held by other records may dangle
//!   afterwards and are reported the next time those records are validated.
//!
//! # Inheritance
//!
//! Lookups are polymorphic. A resource addressed as `Person/p1` resolves to
//! a record stored as `Employee/p1` when `Employee` inherits from `Person`.
//! Identifiers are unique within an inheritance hierarchy.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use entitystore_core::{
    Entity, ExistenceCheck, FetchRequest, Resource, Schema, Store, StoreError, StoreResult,
    ValidationPolicy, Validator, Value, ValuesObject,
};

use crate::index::EntityIndex;
use crate::query;

#[derive(Debug, Default)]
struct Tables {
    records: BTreeMap<Resource, ValuesObject>,
    entity_index: EntityIndex,
}

/// In-memory storage backend
///
/// Thread-safe through `parking_lot::RwLock`. Cheap to share behind an
/// `Arc`.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Arc<Schema>,
    policy: ValidationPolicy,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store for `schema`
    ///
    /// Creation payloads are validated permissively: declared properties
    /// missing from the payload are stored as null.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            policy: ValidationPolicy::Permissive,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Policy applied to creation payloads
    ///
    /// Edits are always validated permissively.
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shared handle to the schema
    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Total number of stored resources
    pub fn len(&self) -> usize {
        self.tables.read().records.len()
    }

    /// Whether the store holds no resources
    pub fn is_empty(&self) -> bool {
        self.tables.read().records.is_empty()
    }

    /// Number of resources stored directly under `entity` (subentities excluded)
    pub fn count(&self, entity: &str) -> usize {
        self.tables.read().entity_index.count(entity)
    }

    fn entity(&self, name: &str) -> StoreResult<&Entity> {
        self.schema
            .entity(name)
            .ok_or_else(|| StoreError::InvalidEntity(name.to_string()))
    }

    fn validator<'a>(&'a self, tables: &'a Tables) -> Validator<LockedView<'a>> {
        Validator::new(LockedView {
            schema: &self.schema,
            tables,
        })
    }
}

impl ExistenceCheck for MemoryStore {
    fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        let tables = self.tables.read();
        LockedView {
            schema: &self.schema,
            tables: &tables,
        }
        .exists(resource)
    }

    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool> {
        let tables = self.tables.read();
        LockedView {
            schema: &self.schema,
            tables: &tables,
        }
        .exist_all(resources)
    }
}

impl Store for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn fetch(&self, request: &FetchRequest) -> StoreResult<Vec<Resource>> {
        let entity = self.entity(&request.entity)?;
        if let Err(e) = request.check(entity) {
            warn!(entity = entity.name(), error = %e, "query rejected");
            return Err(e);
        }

        let mut scope = vec![entity.name()];
        if request.include_subentities {
            scope.extend(self.schema.subentities_of(entity.name()));
        }

        let guard = self.tables.read();
        let tables: &Tables = &guard;
        let candidates = scope.iter().flat_map(move |name| {
            tables
                .entity_index
                .get(name)
                .filter_map(move |resource| tables.records.get_key_value(resource))
        });
        let result = query::execute(request, candidates);

        debug!(
            entity = entity.name(),
            returned = result.len(),
            "fetch complete"
        );
        Ok(result)
    }

    fn create(&self, resource: &Resource, initial: ValuesObject) -> StoreResult<()> {
        let entity = self.entity(resource.entity())?;
        let mut tables = self.tables.write();

        let view = LockedView {
            schema: &self.schema,
            tables: &tables,
        };
        if view.resolve_in_hierarchy(resource).is_some() {
            return Err(StoreError::AlreadyExists(resource.clone()));
        }
        self.validator(&tables)
            .with_policy(self.policy)
            .validate(&initial, entity)?;

        let snapshot: ValuesObject = entity
            .properties()
            .map(|property| {
                let value = initial.get(property.name()).cloned().unwrap_or(Value::Null);
                (property.name().to_string(), value)
            })
            .collect();

        tables.records.insert(resource.clone(), snapshot);
        tables.entity_index.insert(resource.clone());
        debug!(resource = %resource, keys = initial.len(), "created resource");
        Ok(())
    }

    fn delete(&self, resource: &Resource) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let stored = LockedView {
            schema: &self.schema,
            tables: &tables,
        }
        .resolve(resource)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(resource.clone()))?;

        tables.records.remove(&stored);
        tables.entity_index.remove(&stored);
        debug!(resource = %stored, "deleted resource");
        Ok(())
    }

    fn edit(&self, resource: &Resource, changes: ValuesObject) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let stored = LockedView {
            schema: &self.schema,
            tables: &tables,
        }
        .resolve(resource)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(resource.clone()))?;

        // The stored entity may be a subentity declaring more properties.
        let entity = self.entity(stored.entity())?;
        self.validator(&tables).validate(&changes, entity)?;

        let keys = changes.len();
        if let Some(record) = tables.records.get_mut(&stored) {
            record.merge(changes);
        }
        debug!(resource = %stored, keys, "edited resource");
        Ok(())
    }

    fn values(&self, resource: &Resource) -> StoreResult<ValuesObject> {
        let tables = self.tables.read();
        let view = LockedView {
            schema: &self.schema,
            tables: &tables,
        };
        view.resolve(resource)
            .and_then(|stored| tables.records.get(stored))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(resource.clone()))
    }
}

/// Existence oracle over tables the caller already holds a guard for
///
/// Lets validation run under the store's write guard without re-acquiring
/// the lock.
struct LockedView<'a> {
    schema: &'a Schema,
    tables: &'a Tables,
}

impl LockedView<'_> {
    /// Stored resource answering to `resource`, itself or a subentity instance
    fn resolve(&self, resource: &Resource) -> Option<&Resource> {
        std::iter::once(resource.entity())
            .chain(self.schema.subentities_of(resource.entity()))
            .find_map(|name| {
                self.tables
                    .records
                    .get_key_value(&Resource::new(name, resource.id()))
                    .map(|(stored, _)| stored)
            })
    }

    /// Any stored resource sharing `resource`'s identifier within its hierarchy
    fn resolve_in_hierarchy(&self, resource: &Resource) -> Option<&Resource> {
        let mut root = resource.entity();
        while let Some(parent) = self.schema.entity(root).and_then(Entity::parent) {
            root = parent;
        }
        self.resolve(&Resource::new(root, resource.id()))
    }
}

impl ExistenceCheck for LockedView<'_> {
    fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        let found = self.resolve(resource).is_some();
        trace!(resource = %resource, found, "existence check");
        Ok(found)
    }

    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool> {
        let found = resources.iter().all(|r| self.resolve(r).is_some());
        trace!(count = resources.len(), found, "batch existence check");
        Ok(found)
    }
}
