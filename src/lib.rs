//! Entitystore - schema-described entities over pluggable stores
//!
//! Entitystore validates dynamically shaped data against a declared schema,
//! converts it losslessly to and from JSON, and persists it through a store
//! contract that any backend (relational, document, in-memory) can implement.
//!
//! # Quick Start
//!
//! ```
//! use entitystore::{
//!     Attribute, Entity, Relationship, Repository, Resource, Schema, MemoryStore,
//! };
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .entity(
//!         Entity::new("Person")
//!             .with_attribute(Attribute::string("name"))
//!             .with_relationship(Relationship::to_many("friends", "Person").optional()),
//!     )
//!     .build()?;
//!
//! let repo = Repository::new(MemoryStore::new(schema));
//! let alice = Resource::new("Person", "p1");
//! repo.create_from_json(&alice, &json!({"name": "Alice"}))?;
//!
//! assert_eq!(repo.values_as_json(&alice)?["name"], json!("Alice"));
//! # Ok::<(), entitystore::Error>(())
//! ```
//!
//! # Architecture
//!
//! - crate root: schema, values, validation, fetch requests, the store
//!   contract (re-exported from `entitystore-core`)
//! - [`codec`]: JSON decode (schema-driven) and encode (schema-free)
//! - [`storage`]: `MemoryStore`, the reference backend
//! - [`engine`]: configuration, logging and the JSON-facing `Repository`

pub use entitystore_codec as codec;
pub use entitystore_engine as engine;
pub use entitystore_storage as storage;

pub use entitystore_core::*;
pub use entitystore_engine::{EntityStoreConfig, Repository};
pub use entitystore_storage::MemoryStore;
