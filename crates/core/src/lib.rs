//! Core types and traits for entitystore
//!
//! This crate defines the foundational types used throughout the system:
//! - Schema: Entity, Attribute, Relationship declarations (immutable, name-indexed)
//! - Value: tagged union of null, attribute scalars and relationship references
//! - ValuesObject: property name to Value mapping
//! - Resource: (entity, identifier) handle to a persisted instance
//! - Validation: the engine that checks values objects against an entity
//! - FetchRequest: predicate, sort descriptors and pagination of a query
//! - Traits: the store contract (ExistenceCheck, Store)
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fetch;
pub mod resource;
pub mod schema;
pub mod traits;
pub mod validation;
pub mod value;

// Re-export commonly used types and traits
pub use error::{
    DecodeError, DecodeResult, Error, Result, SchemaError, SchemaResult, StoreError, StoreResult,
    ValidationError, ValidationResult,
};
pub use fetch::{ComparisonOp, FetchRequest, Predicate, SortDescriptor};
pub use resource::Resource;
pub use schema::{
    Attribute, AttributeKind, Cardinality, Entity, Property, Relationship, Schema, SchemaBuilder,
};
pub use traits::{ExistenceCheck, Store};
pub use validation::{missing_required, validate, ValidationPolicy, Validator};
pub use value::{Reference, Scalar, Transformable, TransformableDecoder, Value, ValuesObject};
