//! Schema model
//!
//! This module defines the declarations that every values object is
//! interpreted against:
//! - [`Schema`]: immutable container of entities, indexed by name
//! - [`Entity`]: a named type with attributes and relationships
//! - [`Attribute`]: a scalar-typed property ([`AttributeKind`])
//! - [`Relationship`]: a reference-typed property ([`Cardinality`])
//!
//! Relationships refer to their destination entity by *name*, so cyclic
//! models (e.g. `Person.friends -> Person`) need no shared ownership.
//! Whether a destination name resolves is the schema author's concern.
//!
//! ## Inheritance
//!
//! An entity may name a parent. [`SchemaBuilder::build`] flattens the
//! ancestor chain so that a subentity carries every inherited attribute
//! and relationship, ancestors first.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::value::TransformableDecoder;

// ============================================================================
// Attribute
// ============================================================================

/// Declared type tag of an attribute
///
/// The tag is the sole authority for validating and decoding any value
/// bound to the attribute's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// UTF-8 text
    String,
    /// Point in time
    Date,
    /// Raw byte sequence
    Binary,
    /// Boolean
    Boolean,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Double,
    /// Opaque payload with its own JSON encode/decode capability
    Transformable,
}

impl AttributeKind {
    /// Lower-case name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Date => "date",
            AttributeKind::Binary => "binary",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Integer => "integer",
            AttributeKind::Double => "double",
            AttributeKind::Transformable => "transformable",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar-typed property declaration
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    optional: bool,
    decoder: Option<Arc<dyn TransformableDecoder>>,
}

impl Attribute {
    /// Declare a required attribute of the given kind
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Attribute {
            name: name.into(),
            kind,
            optional: false,
            decoder: None,
        }
    }

    /// Declare a required string attribute
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::String)
    }

    /// Declare a required date attribute
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Date)
    }

    /// Declare a required binary attribute
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Binary)
    }

    /// Declare a required boolean attribute
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Boolean)
    }

    /// Declare a required integer attribute
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Integer)
    }

    /// Declare a required double attribute
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Double)
    }

    /// Declare a required transformable attribute decoded by `decoder`
    pub fn transformable(name: impl Into<String>, decoder: Arc<dyn TransformableDecoder>) -> Self {
        Attribute {
            decoder: Some(decoder),
            ..Self::new(name, AttributeKind::Transformable)
        }
    }

    /// Mark the attribute optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type tag
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Whether null is an acceptable value
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Decoder for transformable payloads, if declared
    pub fn decoder(&self) -> Option<&Arc<dyn TransformableDecoder>> {
        self.decoder.as_ref()
    }
}

// ============================================================================
// Relationship
// ============================================================================

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one destination instance
    ToOne,
    /// An ordered or unordered collection of destination instances
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => f.write_str("to-one"),
            Cardinality::ToMany => f.write_str("to-many"),
        }
    }
}

/// A reference-typed property declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    name: String,
    destination: String,
    cardinality: Cardinality,
    optional: bool,
    ordered: bool,
}

impl Relationship {
    /// Declare a required to-one relationship
    pub fn to_one(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Relationship {
            name: name.into(),
            destination: destination.into(),
            cardinality: Cardinality::ToOne,
            optional: false,
            ordered: false,
        }
    }

    /// Declare a required, unordered to-many relationship
    pub fn to_many(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Relationship {
            cardinality: Cardinality::ToMany,
            ..Self::to_one(name, destination)
        }
    }

    /// Mark the relationship optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark a to-many relationship ordered (no effect on to-one)
    pub fn ordered(mut self) -> Self {
        self.ordered = self.cardinality == Cardinality::ToMany;
        self
    }

    /// Relationship name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination entity name
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Declared cardinality
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether null is an acceptable value
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether a to-many relationship preserves order
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A resolved property: a values-object key maps to exactly one of these
#[derive(Debug, Clone, Copy)]
pub enum Property<'a> {
    /// Scalar-typed property
    Attribute(&'a Attribute),
    /// Reference-typed property
    Relationship(&'a Relationship),
}

impl<'a> Property<'a> {
    /// Property name
    pub fn name(&self) -> &'a str {
        match self {
            Property::Attribute(a) => a.name(),
            Property::Relationship(r) => r.name(),
        }
    }

    /// Whether null is an acceptable value
    pub fn is_optional(&self) -> bool {
        match self {
            Property::Attribute(a) => a.is_optional(),
            Property::Relationship(r) => r.is_optional(),
        }
    }
}

/// A named schema type declaring attributes and relationships
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    parent: Option<String>,
    attributes: Vec<Attribute>,
    relationships: Vec<Relationship>,
}

impl Entity {
    /// Start declaring an entity
    pub fn new(name: impl Into<String>) -> Self {
        Entity {
            name: name.into(),
            parent: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Declare the parent entity this one inherits from
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add an attribute declaration
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a relationship declaration
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent entity name, if any
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Attribute declarations in declaration order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Relationship declarations in declaration order
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up a relationship by name
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Resolve a key against attributes first, then relationships
    pub fn property(&self, name: &str) -> Option<Property<'_>> {
        self.attribute(name)
            .map(Property::Attribute)
            .or_else(|| self.relationship(name).map(Property::Relationship))
    }

    /// All properties, attributes first
    pub fn properties(&self) -> impl Iterator<Item = Property<'_>> {
        self.attributes
            .iter()
            .map(Property::Attribute)
            .chain(self.relationships.iter().map(Property::Relationship))
    }

    fn check_disjoint(&self) -> SchemaResult<()> {
        let mut seen = BTreeSet::new();
        for property in self.properties() {
            if !seen.insert(property.name()) {
                return Err(SchemaError::DuplicateProperty {
                    entity: self.name.clone(),
                    property: property.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Immutable, name-indexed collection of entities
///
/// Built once with [`SchemaBuilder`] and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: BTreeMap<String, Entity>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Whether an entity with this name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// All entities, ordered by name
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Whether `entity` is `ancestor` or inherits from it
    pub fn is_kind_of(&self, entity: &str, ancestor: &str) -> bool {
        let mut current = Some(entity);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.entities.get(name).and_then(Entity::parent);
        }
        false
    }

    /// Names of every entity that transitively inherits from `name`
    pub fn subentities_of(&self, name: &str) -> Vec<&str> {
        self.entities
            .keys()
            .filter(|candidate| candidate.as_str() != name && self.is_kind_of(candidate, name))
            .map(String::as_str)
            .collect()
    }
}

/// Collects entity declarations and validates them into a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entities: Vec<Entity>,
}

impl SchemaBuilder {
    /// Add an entity declaration
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validate the declarations and flatten inheritance
    ///
    /// # Errors
    ///
    /// - `DuplicateEntity` if two entities share a name
    /// - `UnknownParent` if a parent name does not resolve
    /// - `InheritanceCycle` if the parent chain loops
    /// - `DuplicateProperty` if a (flattened) entity declares a name twice
    pub fn build(self) -> SchemaResult<Schema> {
        let mut declared: BTreeMap<String, Entity> = BTreeMap::new();
        for entity in self.entities {
            if declared.contains_key(&entity.name) {
                return Err(SchemaError::DuplicateEntity(entity.name));
            }
            declared.insert(entity.name.clone(), entity);
        }

        let mut entities = BTreeMap::new();
        for (name, entity) in &declared {
            let chain = ancestor_chain(&declared, name)?;
            let mut flattened = Entity {
                name: name.clone(),
                parent: entity.parent.clone(),
                attributes: Vec::new(),
                relationships: Vec::new(),
            };
            // Root ancestor first so inherited properties keep their order.
            for ancestor in chain.iter().rev() {
                flattened.attributes.extend(ancestor.attributes.iter().cloned());
                flattened
                    .relationships
                    .extend(ancestor.relationships.iter().cloned());
            }
            flattened.check_disjoint()?;
            entities.insert(name.clone(), flattened);
        }

        Ok(Schema { entities })
    }
}

/// Entity followed by its ancestors, nearest first
fn ancestor_chain<'a>(
    declared: &'a BTreeMap<String, Entity>,
    name: &str,
) -> SchemaResult<Vec<&'a Entity>> {
    let mut chain: Vec<&Entity> = Vec::new();
    let mut current = declared.get(name);
    while let Some(entity) = current {
        if chain.iter().any(|seen| seen.name == entity.name) {
            return Err(SchemaError::InheritanceCycle(name.to_string()));
        }
        chain.push(entity);
        current = match &entity.parent {
            Some(parent) => Some(declared.get(parent).ok_or_else(|| {
                SchemaError::UnknownParent {
                    entity: entity.name.clone(),
                    parent: parent.clone(),
                }
            })?),
            None => None,
        };
    }
    Ok(chain)
}
