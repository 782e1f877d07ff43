//! Shared fixtures for the scenario suite.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

pub use entitystore::{
    Attribute, Entity, EntityStoreConfig, Error, MemoryStore, Relationship, Repository, Resource,
    Schema, Store, StoreError, ValidationError, Value, ValuesObject,
};
pub use serde_json::json;

/// Install the test subscriber once per process.
pub fn init_logging() {
    entitystore::engine::logging::init_for_tests();
}

/// `Person { name: string, friends: to-many Person? }`
pub fn person_entity() -> Entity {
    Entity::new("Person")
        .with_attribute(Attribute::string("name"))
        .with_relationship(Relationship::to_many("friends", "Person").optional())
}

/// `Person { name: string }` only, no other properties.
pub fn name_only_entity() -> Entity {
    Entity::new("Person").with_attribute(Attribute::string("name"))
}

/// `Document { avatar: binary }`
pub fn document_entity() -> Entity {
    Entity::new("Document").with_attribute(Attribute::binary("avatar"))
}

pub fn schema() -> Schema {
    Schema::builder()
        .entity(person_entity())
        .entity(document_entity())
        .build()
        .unwrap()
}

/// Store shared between a repository and direct assertions.
pub fn shared_store() -> Arc<MemoryStore> {
    init_logging();
    Arc::new(MemoryStore::new(schema()))
}

/// Repository with default settings over a fresh store.
pub fn repository() -> Repository<MemoryStore> {
    init_logging();
    Repository::new(MemoryStore::new(schema()))
}

/// Seed people with the given identifiers, named after themselves.
pub fn seed_people(store: &MemoryStore, ids: &[&str]) {
    for id in ids {
        store
            .create(
                &Resource::new("Person", *id),
                ValuesObject::new().with("name", *id),
            )
            .unwrap();
    }
}

/// Temp directory holding a config file with the given body.
pub fn config_dir(body: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(entitystore::engine::CONFIG_FILE_NAME);
    std::fs::write(&path, body).unwrap();
    (dir, path)
}
