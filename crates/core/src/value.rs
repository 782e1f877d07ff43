//! Value types for entitystore
//!
//! This module defines:
//! - [`Value`]: one property's content (null, attribute scalar, or reference)
//! - [`Scalar`]: the seven attribute scalar kinds
//! - [`Reference`]: to-one or to-many relationship content
//! - [`ValuesObject`]: property name to [`Value`] mapping
//! - [`Transformable`] / [`TransformableDecoder`]: the capability set of
//!   opaque custom attribute payloads
//!
//! ## Type Rules
//!
//! - No implicit coercions: `Integer(1) != Double(1.0)`, `Boolean(true) != Integer(1)`
//! - Double equality is IEEE-754: `NaN != NaN`, `-0.0 == 0.0`
//! - Ordering is only defined between like variants; [`Value::compare`]
//!   returns `None` for anything else
//!
//! A `Value` never validates itself. Whether it fits the property it is
//! bound to is decided by [`crate::validation`].

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::schema::AttributeKind;

// ============================================================================
// Transformable payloads
// ============================================================================

/// An opaque attribute payload that knows how to encode itself
///
/// Implementors are custom types the core knows nothing about beyond this
/// capability set. The matching decode half lives on the attribute
/// declaration as a [`TransformableDecoder`].
pub trait Transformable: fmt::Debug + Send + Sync {
    /// Stable name of the payload type, matched against the declared decoder
    fn type_name(&self) -> &str;

    /// Encode the payload as a JSON document
    fn to_json(&self) -> JsonValue;

    /// Access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Payload equality
    ///
    /// Defaults to comparing type names and JSON encodings.
    fn eq_payload(&self, other: &dyn Transformable) -> bool {
        self.type_name() == other.type_name() && self.to_json() == other.to_json()
    }
}

/// Decodes one transformable payload type from JSON
pub trait TransformableDecoder: fmt::Debug + Send + Sync {
    /// Name of the payload type this decoder produces
    fn type_name(&self) -> &str;

    /// Decode a payload, or `None` if the document has the wrong shape
    fn from_json(&self, json: &JsonValue) -> Option<Arc<dyn Transformable>>;
}

// ============================================================================
// Scalar
// ============================================================================

/// An attribute scalar carrying its native payload
#[derive(Debug, Clone)]
pub enum Scalar {
    /// UTF-8 text
    String(String),
    /// Point in time
    Date(DateTime<Utc>),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float (IEEE-754)
    Double(f64),
    /// Opaque custom payload
    Transformable(Arc<dyn Transformable>),
}

impl Scalar {
    /// The attribute kind this scalar satisfies
    pub fn kind(&self) -> AttributeKind {
        match self {
            Scalar::String(_) => AttributeKind::String,
            Scalar::Date(_) => AttributeKind::Date,
            Scalar::Binary(_) => AttributeKind::Binary,
            Scalar::Boolean(_) => AttributeKind::Boolean,
            Scalar::Integer(_) => AttributeKind::Integer,
            Scalar::Double(_) => AttributeKind::Double,
            Scalar::Transformable(_) => AttributeKind::Transformable,
        }
    }

    /// Compare two scalars of the same kind
    ///
    /// Doubles use the IEEE total order so a sort never sees an
    /// inconsistent comparison. Transformable payloads are incomparable.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::Binary(a), Scalar::Binary(b)) => Some(a.cmp(b)),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => Some(a.cmp(b)),
            (Scalar::Integer(a), Scalar::Integer(b)) => Some(a.cmp(b)),
            (Scalar::Double(a), Scalar::Double(b)) => Some(a.total_cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Date(a), Scalar::Date(b)) => a == b,
            (Scalar::Binary(a), Scalar::Binary(b)) => a == b,
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Scalar::Double(a), Scalar::Double(b)) => a == b,
            (Scalar::Transformable(a), Scalar::Transformable(b)) => a.eq_payload(b.as_ref()),
            _ => false,
        }
    }
}

// ============================================================================
// Reference
// ============================================================================

/// Relationship content: identifiers of destination instances
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reference {
    /// Single identifier, valid for to-one relationships
    ToOne(String),
    /// Ordered identifiers, valid for to-many relationships
    ToMany(Vec<String>),
}

impl Reference {
    /// Referenced identifiers in order
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Reference::ToOne(id) => vec![id.as_str()],
            Reference::ToMany(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}

// ============================================================================
// Value
// ============================================================================

/// One property's current content
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or explicitly null
    #[default]
    Null,
    /// Attribute scalar
    Attribute(Scalar),
    /// Relationship reference
    Relationship(Reference),
}

impl Value {
    /// Build a to-one reference
    pub fn to_one(id: impl Into<String>) -> Self {
        Value::Relationship(Reference::ToOne(id.into()))
    }

    /// Build a to-many reference
    pub fn to_many<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Relationship(Reference::ToMany(ids.into_iter().map(Into::into).collect()))
    }

    /// Wrap a transformable payload
    pub fn transformable(payload: Arc<dyn Transformable>) -> Self {
        Value::Attribute(Scalar::Transformable(payload))
    }

    /// Short description of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Attribute(scalar) => scalar.kind().as_str(),
            Value::Relationship(Reference::ToOne(_)) => "to-one reference",
            Value::Relationship(Reference::ToMany(_)) => "to-many reference",
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the scalar if this is an attribute value
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Attribute(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Get the reference if this is a relationship value
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Relationship(reference) => Some(reference),
            _ => None,
        }
    }

    /// Get as &str if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Attribute(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer scalar
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Attribute(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a double scalar
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Attribute(Scalar::Double(f)) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if this is a boolean scalar
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Attribute(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get as bytes if this is a binary scalar
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Attribute(Scalar::Binary(b)) => Some(b),
            _ => None,
        }
    }

    /// Get the timestamp if this is a date scalar
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Attribute(Scalar::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Compare like-with-like variants
    ///
    /// Returns `None` ("incomparable") for mismatched variants, for null,
    /// and for transformable payloads. Never fails.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Attribute(a), Value::Attribute(b)) => a.compare(b),
            (
                Value::Relationship(Reference::ToOne(a)),
                Value::Relationship(Reference::ToOne(b)),
            ) => Some(a.cmp(b)),
            (
                Value::Relationship(Reference::ToMany(a)),
                Value::Relationship(Reference::ToMany(b)),
            ) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Attribute(s)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Relationship(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Attribute(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Attribute(Scalar::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Attribute(Scalar::Boolean(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Attribute(Scalar::Integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Attribute(Scalar::Integer(i as i64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Attribute(Scalar::Double(f))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Attribute(Scalar::Double(f as f64))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Attribute(Scalar::Binary(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Attribute(Scalar::Binary(b.to_vec()))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Attribute(Scalar::Date(d))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

// ============================================================================
// ValuesObject
// ============================================================================

/// Mapping from property name to [`Value`]
///
/// Used as a creation payload, a partial update, or a full snapshot read
/// back from a store. Keys iterate in name order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValuesObject(BTreeMap<String, Value>);

impl ValuesObject {
    /// Create an empty values object
    pub fn new() -> Self {
        ValuesObject(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Value bound to `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value bound to `key`, treating absence as null
    pub fn get_or_null(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(key).unwrap_or(&NULL)
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys in name order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite keys present in `changes`
    pub fn merge(&mut self, changes: ValuesObject) {
        self.0.extend(changes.0);
    }
}

impl FromIterator<(String, Value)> for ValuesObject {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        ValuesObject(iter.into_iter().collect())
    }
}

impl IntoIterator for ValuesObject {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
