//! Repository: JSON-facing facade over a Store
//!
//! Runs the full data flow for callers that speak JSON:
//!
//! - writes: JSON document → decode against the entity → store create/edit
//!   (which validates, consulting the store for relationship existence)
//! - reads: store values → encode to JSON
//!
//! The creation policy decides how declared properties missing from a
//! creation document are treated. Under [`ValidationPolicy::Strict`] they
//! decode as null and so must be optional; under
//! [`ValidationPolicy::Permissive`] they are left out of the payload and the
//! store records them as unset.

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use entitystore_codec::{decode, decode_changes, encode};
use entitystore_core::{
    Entity, FetchRequest, Resource, Result, Store, StoreError, ValidationPolicy, ValuesObject,
};

use crate::config::{ConfigResult, EntityStoreConfig};

/// JSON-facing facade over any [`Store`]
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    policy: ValidationPolicy,
    max_fetch_limit: Option<usize>,
}

impl<S: Store> Repository<S> {
    /// Wrap `store` with the default configuration
    pub fn new(store: S) -> Self {
        Repository {
            store,
            policy: ValidationPolicy::Strict,
            max_fetch_limit: None,
        }
    }

    /// Wrap `store` with settings from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the config holds an invalid value.
    pub fn with_config(store: S, config: &EntityStoreConfig) -> ConfigResult<Self> {
        config.validate()?;
        let policy = config.validation_policy()?;
        info!(
            creation_policy = ?policy,
            max_fetch_limit = ?config.max_fetch_limit,
            "repository opened"
        );
        Ok(Repository {
            store,
            policy,
            max_fetch_limit: config.max_fetch_limit,
        })
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active creation policy
    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    fn entity(&self, name: &str) -> Result<&Entity> {
        self.store
            .schema()
            .entity(name)
            .ok_or_else(|| StoreError::InvalidEntity(name.to_string()).into())
    }

    /// Decode `document` and create `resource` from it
    ///
    /// # Errors
    ///
    /// - `Decode` if the document does not fit the entity
    /// - `Store` for anything the store rejects, including validation
    pub fn create_from_json(&self, resource: &Resource, document: &JsonValue) -> Result<()> {
        let entity = self.entity(resource.entity())?;
        let values = match self.policy {
            ValidationPolicy::Strict => decode(document, entity)?,
            ValidationPolicy::Permissive => decode_changes(document, entity)?,
        };
        debug!(resource = %resource, keys = values.len(), "creating from json");
        self.store.create(resource, values)?;
        Ok(())
    }

    /// Create a new instance of `entity` under a fresh UUID identifier
    ///
    /// # Errors
    ///
    /// Same as [`create_from_json`](Self::create_from_json).
    pub fn create_new_from_json(&self, entity: &str, document: &JsonValue) -> Result<Resource> {
        let resource = Resource::generate(entity);
        self.create_from_json(&resource, document)?;
        Ok(resource)
    }

    /// Apply the keys present in `document` as a partial update
    ///
    /// # Errors
    ///
    /// - `Decode` if the document does not fit the entity
    /// - `Store` with `NotFound` or `InvalidValues`
    pub fn edit_from_json(&self, resource: &Resource, document: &JsonValue) -> Result<()> {
        let entity = self.entity(resource.entity())?;
        let changes = decode_changes(document, entity)?;
        debug!(resource = %resource, keys = changes.len(), "editing from json");
        self.store.edit(resource, changes)?;
        Ok(())
    }

    /// Full snapshot of `resource` as a JSON object
    ///
    /// # Errors
    ///
    /// Returns `Store` with `NotFound` if the resource does not exist.
    pub fn values_as_json(&self, resource: &Resource) -> Result<JsonValue> {
        Ok(encode(&self.store.values(resource)?))
    }

    /// Run `request`, capped by the configured maximum
    ///
    /// # Errors
    ///
    /// Returns `Store` with `InvalidEntity` or `Query`.
    pub fn fetch(&self, request: &FetchRequest) -> Result<Vec<Resource>> {
        match self.capped(request) {
            Some(capped) => Ok(self.store.fetch(&capped)?),
            None => Ok(self.store.fetch(request)?),
        }
    }

    /// Run `request` and read back each result's values
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch); a resource deleted between the fetch
    /// and the read surfaces as `NotFound`.
    pub fn fetch_values(&self, request: &FetchRequest) -> Result<Vec<(Resource, ValuesObject)>> {
        self.fetch(request)?
            .into_iter()
            .map(|resource| -> Result<(Resource, ValuesObject)> {
                let values = self.store.values(&resource)?;
                Ok((resource, values))
            })
            .collect()
    }

    /// Remove `resource`
    ///
    /// # Errors
    ///
    /// Returns `Store` with `NotFound` if the resource does not exist.
    pub fn delete(&self, resource: &Resource) -> Result<()> {
        self.store.delete(resource)?;
        debug!(resource = %resource, "deleted");
        Ok(())
    }

    /// Copy of `request` with the limit capped, if a cap applies
    fn capped(&self, request: &FetchRequest) -> Option<FetchRequest> {
        let cap = self.max_fetch_limit?;
        if request.limit != 0 && request.limit <= cap {
            return None;
        }
        Some(request.clone().limit(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entitystore_core::{
        Attribute, DecodeError, Error, Relationship, Schema, SortDescriptor, ValidationError,
        Value,
    };
    use entitystore_storage::MemoryStore;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .entity(
                Entity::new("Person")
                    .with_attribute(Attribute::string("name"))
                    .with_attribute(Attribute::integer("age").optional())
                    .with_relationship(Relationship::to_many("friends", "Person").optional()),
            )
            .build()
            .unwrap()
    }

    fn repository(config: EntityStoreConfig) -> Repository<MemoryStore> {
        Repository::with_config(MemoryStore::new(schema()), &config).unwrap()
    }

    #[test]
    fn test_create_and_read_back() {
        let repo = repository(EntityStoreConfig::default());
        let p1 = Resource::new("Person", "p1");
        repo.create_from_json(&p1, &json!({"name": "Alice", "age": 30}))
            .unwrap();

        assert_eq!(
            repo.values_as_json(&p1).unwrap(),
            json!({"name": "Alice", "age": 30, "friends": null})
        );
    }

    #[test]
    fn test_strict_policy_rejects_missing_required() {
        let repo = repository(EntityStoreConfig::default());
        let err = repo
            .create_from_json(&Resource::new("Person", "p1"), &json!({"age": 30}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::InvalidValues(ValidationError::RequiredValueMissing { property, .. }))
                if property == "name"
        ));
    }

    #[test]
    fn test_permissive_policy_leaves_missing_unset() {
        let repo = repository(EntityStoreConfig {
            creation_policy: "permissive".to_string(),
            ..EntityStoreConfig::default()
        });
        let p1 = Resource::new("Person", "p1");
        repo.create_from_json(&p1, &json!({"age": 30})).unwrap();
        assert_eq!(
            repo.store().values(&p1).unwrap().get("name"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_decode_failure_surfaces_as_decode_error() {
        let repo = repository(EntityStoreConfig::default());
        let err = repo
            .create_from_json(&Resource::new("Person", "p1"), &json!({"name": 7}))
            .unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::DecodeFailure { .. })));
        assert!(repo.store().is_empty());
    }

    #[test]
    fn test_create_new_generates_identifier() {
        let repo = repository(EntityStoreConfig::default());
        let a = repo
            .create_new_from_json("Person", &json!({"name": "Alice"}))
            .unwrap();
        let b = repo
            .create_new_from_json("Person", &json!({"name": "Bob"}))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(a.entity(), "Person");
        assert_eq!(repo.store().len(), 2);
    }

    #[test]
    fn test_unknown_entity() {
        let repo = repository(EntityStoreConfig::default());
        let err = repo
            .create_new_from_json("Robot", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::InvalidEntity(_))));
    }

    #[test]
    fn test_edit_only_touches_present_keys() {
        let repo = repository(EntityStoreConfig::default());
        let p1 = Resource::new("Person", "p1");
        repo.create_from_json(&p1, &json!({"name": "Alice", "age": 30}))
            .unwrap();
        repo.edit_from_json(&p1, &json!({"age": 31})).unwrap();

        let values = repo.values_as_json(&p1).unwrap();
        assert_eq!(values["name"], json!("Alice"));
        assert_eq!(values["age"], json!(31));
    }

    #[test]
    fn test_fetch_is_capped() {
        let repo = repository(EntityStoreConfig {
            max_fetch_limit: Some(2),
            ..EntityStoreConfig::default()
        });
        for name in ["a", "b", "c"] {
            repo.create_from_json(&Resource::new("Person", name), &json!({"name": name}))
                .unwrap();
        }

        let sorted = FetchRequest::new("Person").sort_by(SortDescriptor::ascending("name"));
        assert_eq!(repo.fetch(&sorted).unwrap().len(), 2);
        assert_eq!(repo.fetch(&sorted.clone().limit(1)).unwrap().len(), 1);
        assert_eq!(repo.fetch(&sorted.clone().limit(10)).unwrap().len(), 2);

        let values = repo.fetch_values(&sorted).unwrap();
        assert_eq!(values[0].1.get("name"), Some(&Value::from("a")));
    }

    #[test]
    fn test_delete() {
        let repo = repository(EntityStoreConfig::default());
        let p1 = Resource::new("Person", "p1");
        repo.create_from_json(&p1, &json!({"name": "Alice"})).unwrap();
        repo.delete(&p1).unwrap();
        assert!(matches!(
            repo.delete(&p1),
            Err(Error::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_with_invalid_config() {
        let config = EntityStoreConfig {
            creation_policy: "loose".to_string(),
            ..EntityStoreConfig::default()
        };
        assert!(Repository::with_config(MemoryStore::new(schema()), &config).is_err());
    }
}
