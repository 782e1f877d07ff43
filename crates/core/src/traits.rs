//! Store contract
//!
//! This module defines the capability set every storage backend
//! (relational, document, in-memory) implements to integrate with the core.
//!
//! - [`ExistenceCheck`]: the narrow oracle the validation engine consults
//!   for relationship references
//! - [`Store`]: CRUD plus fetch
//!
//! The core ships the contract and the validation engine's dependency on
//! it, not a backend. Stores surface their own failures verbatim; retry
//! policy, if any, belongs to the implementation.

use crate::error::StoreResult;
use crate::fetch::FetchRequest;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::value::ValuesObject;

/// Existence oracle for relationship validation
///
/// Thread safety: implementations must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait ExistenceCheck: Send + Sync {
    /// Whether `resource` currently exists
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot answer.
    fn exists(&self, resource: &Resource) -> StoreResult<bool>;

    /// Whether every resource in `resources` exists
    ///
    /// Must observe a single consistent snapshot, not a loop of independent
    /// reads that a concurrent delete could interleave with. Implementations
    /// should document the isolation level they actually provide. An empty
    /// slice is vacuously `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot answer.
    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool>;
}

/// Storage backend contract
///
/// Backends live outside the core; `entitystore-storage` provides an
/// in-memory one.
pub trait Store: ExistenceCheck {
    /// Schema this store persists
    fn schema(&self) -> &Schema;

    /// Resources matching the request's predicate, ordered and sliced
    ///
    /// # Errors
    ///
    /// - `InvalidEntity` if the request names an undeclared entity
    /// - `Query` if the predicate or sort instructions are malformed
    fn fetch(&self, request: &FetchRequest) -> StoreResult<Vec<Resource>>;

    /// Persist a new resource with its initial values
    ///
    /// # Errors
    ///
    /// - `InvalidEntity` if the resource's entity is undeclared
    /// - `InvalidValues` if validation fails (nothing is written)
    /// - `AlreadyExists` if the resource is already persisted
    fn create(&self, resource: &Resource, initial: ValuesObject) -> StoreResult<()>;

    /// Remove a resource
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the resource does not exist.
    fn delete(&self, resource: &Resource) -> StoreResult<()>;

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource does not exist
    /// - `InvalidValues` if validation fails (nothing is written)
    fn edit(&self, resource: &Resource, changes: ValuesObject) -> StoreResult<()>;

    /// Full snapshot of a resource's values
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the resource does not exist.
    fn values(&self, resource: &Resource) -> StoreResult<ValuesObject>;
}

impl<T: ExistenceCheck + ?Sized> ExistenceCheck for &T {
    fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        (**self).exists(resource)
    }

    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool> {
        (**self).exist_all(resources)
    }
}

impl<T: ExistenceCheck + ?Sized> ExistenceCheck for std::sync::Arc<T> {
    fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        (**self).exists(resource)
    }

    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool> {
        (**self).exist_all(resources)
    }
}

impl<T: Store + ?Sized> Store for std::sync::Arc<T> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn fetch(&self, request: &FetchRequest) -> StoreResult<Vec<Resource>> {
        (**self).fetch(request)
    }

    fn create(&self, resource: &Resource, initial: ValuesObject) -> StoreResult<()> {
        (**self).create(resource, initial)
    }

    fn delete(&self, resource: &Resource) -> StoreResult<()> {
        (**self).delete(resource)
    }

    fn edit(&self, resource: &Resource, changes: ValuesObject) -> StoreResult<()> {
        (**self).edit(resource, changes)
    }

    fn values(&self, resource: &Resource) -> StoreResult<ValuesObject> {
        (**self).values(resource)
    }
}
