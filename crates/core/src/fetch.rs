//! Fetch requests
//!
//! A [`FetchRequest`] is a declarative query description: which entity,
//! an optional [`Predicate`], ordering via [`SortDescriptor`]s, whether
//! subentities are included, and limit/offset pagination.
//!
//! Predicates are checked against the entity before execution
//! ([`Predicate::check`]) and then evaluated against one resource's values
//! at a time ([`Predicate::evaluate`]). Keys absent from a values object
//! evaluate as null.

use std::cmp::Ordering;

use crate::error::{StoreError, StoreResult};
use crate::schema::{AttributeKind, Cardinality, Entity, Property};
use crate::value::{Reference, Scalar, Value, ValuesObject};

// ============================================================================
// Predicate
// ============================================================================

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

impl ComparisonOp {
    fn is_equality(&self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

/// Boolean expression over one resource's values
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every resource
    All,
    /// Compare a property with a constant
    Compare {
        /// Property name
        property: String,
        /// Operator
        op: ComparisonOp,
        /// Constant operand
        value: Value,
    },
    /// Property is null or absent
    IsNull(String),
    /// Substring match on a string attribute, or membership in a to-many relationship
    Contains {
        /// Property name
        property: String,
        /// Substring or identifier
        needle: String,
    },
    /// All operands match
    And(Vec<Predicate>),
    /// At least one operand matches
    Or(Vec<Predicate>),
    /// Operand does not match
    Not(Box<Predicate>),
}

impl Predicate {
    /// `property == value`
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Eq, value)
    }

    /// `property != value`
    pub fn ne(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Ne, value)
    }

    /// `property < value`
    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Lt, value)
    }

    /// `property <= value`
    pub fn le(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Le, value)
    }

    /// `property > value`
    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Gt, value)
    }

    /// `property >= value`
    pub fn ge(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, ComparisonOp::Ge, value)
    }

    /// Generic comparison
    pub fn compare(property: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    /// Property is null or absent
    pub fn is_null(property: impl Into<String>) -> Self {
        Predicate::IsNull(property.into())
    }

    /// Substring or membership test
    pub fn contains(property: impl Into<String>, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            property: property.into(),
            needle: needle.into(),
        }
    }

    /// Conjunction with another predicate
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut operands) => {
                operands.push(other);
                Predicate::And(operands)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Disjunction with another predicate
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut operands) => {
                operands.push(other);
                Predicate::Or(operands)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Reject predicates that cannot be evaluated against `entity`
    ///
    /// # Errors
    ///
    /// Returns `Query` if a property is undeclared, if a constant has the
    /// wrong kind for its property, if an ordering operator is applied to a
    /// relationship or transformable, or if `Contains` targets anything other
    /// than a string attribute or to-many relationship.
    pub fn check(&self, entity: &Entity) -> StoreResult<()> {
        match self {
            Predicate::All => Ok(()),
            Predicate::IsNull(property) => resolve(entity, property).map(|_| ()),
            Predicate::Compare {
                property,
                op,
                value,
            } => check_comparison(entity, property, *op, value),
            Predicate::Contains { property, .. } => match resolve(entity, property)? {
                Property::Attribute(a) if a.kind() == AttributeKind::String => Ok(()),
                Property::Relationship(r) if r.cardinality() == Cardinality::ToMany => Ok(()),
                _ => Err(StoreError::query(format!(
                    "contains is not supported on '{}.{}'",
                    entity.name(),
                    property
                ))),
            },
            Predicate::And(operands) | Predicate::Or(operands) => {
                operands.iter().try_for_each(|p| p.check(entity))
            }
            Predicate::Not(inner) => inner.check(entity),
        }
    }

    /// Evaluate against one resource's values
    pub fn evaluate(&self, values: &ValuesObject) -> bool {
        match self {
            Predicate::All => true,
            Predicate::IsNull(property) => values.get_or_null(property).is_null(),
            Predicate::Compare {
                property,
                op,
                value,
            } => evaluate_comparison(values.get_or_null(property), *op, value),
            Predicate::Contains { property, needle } => match values.get_or_null(property) {
                Value::Attribute(Scalar::String(s)) => s.contains(needle.as_str()),
                Value::Relationship(Reference::ToMany(ids)) => ids.iter().any(|id| id == needle),
                _ => false,
            },
            Predicate::And(operands) => operands.iter().all(|p| p.evaluate(values)),
            Predicate::Or(operands) => operands.iter().any(|p| p.evaluate(values)),
            Predicate::Not(inner) => !inner.evaluate(values),
        }
    }
}

fn resolve<'a>(entity: &'a Entity, property: &str) -> StoreResult<Property<'a>> {
    entity.property(property).ok_or_else(|| {
        StoreError::query(format!(
            "unknown property '{}' on entity '{}'",
            property,
            entity.name()
        ))
    })
}

fn check_comparison(
    entity: &Entity,
    property: &str,
    op: ComparisonOp,
    value: &Value,
) -> StoreResult<()> {
    let resolved = resolve(entity, property)?;
    let mismatch = || {
        StoreError::query(format!(
            "cannot compare '{}.{}' with {} using {:?}",
            entity.name(),
            property,
            value.kind_name(),
            op
        ))
    };

    match (resolved, value) {
        (_, Value::Null) if op.is_equality() => Ok(()),
        (Property::Attribute(a), Value::Attribute(scalar)) if a.kind() == scalar.kind() => {
            if matches!(scalar, Scalar::Transformable(_)) && !op.is_equality() {
                Err(mismatch())
            } else {
                Ok(())
            }
        }
        (Property::Relationship(r), Value::Relationship(Reference::ToOne(_)))
            if r.cardinality() == Cardinality::ToOne && op.is_equality() =>
        {
            Ok(())
        }
        (Property::Relationship(r), Value::Relationship(Reference::ToMany(_)))
            if r.cardinality() == Cardinality::ToMany && op.is_equality() =>
        {
            Ok(())
        }
        _ => Err(mismatch()),
    }
}

fn evaluate_comparison(actual: &Value, op: ComparisonOp, expected: &Value) -> bool {
    // Null and incomparable operands never satisfy an ordering.
    let ordering = || actual.compare(expected);
    match op {
        ComparisonOp::Eq => actual == expected,
        ComparisonOp::Ne => actual != expected,
        ComparisonOp::Lt => ordering() == Some(Ordering::Less),
        ComparisonOp::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        ComparisonOp::Gt => ordering() == Some(Ordering::Greater),
        ComparisonOp::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
    }
}

// ============================================================================
// Sort descriptors
// ============================================================================

/// One ordering instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    /// Property to order by
    pub property: String,
    /// Ascending when true
    pub ascending: bool,
}

impl SortDescriptor {
    /// Order by `property`, smallest first
    pub fn ascending(property: impl Into<String>) -> Self {
        SortDescriptor {
            property: property.into(),
            ascending: true,
        }
    }

    /// Order by `property`, largest first
    pub fn descending(property: impl Into<String>) -> Self {
        SortDescriptor {
            property: property.into(),
            ascending: false,
        }
    }

    /// Reject descriptors naming an undeclared property
    ///
    /// # Errors
    ///
    /// Returns `Query` if the property is not declared on `entity`.
    pub fn check(&self, entity: &Entity) -> StoreResult<()> {
        resolve(entity, &self.property).map(|_| ())
    }

    /// Compare two values objects by this descriptor
    ///
    /// Nulls come first in ascending order. Incomparable values fall back to
    /// a fixed rank per variant so the result is always a total order.
    pub fn compare(&self, a: &ValuesObject, b: &ValuesObject) -> Ordering {
        let left = a.get_or_null(&self.property);
        let right = b.get_or_null(&self.property);
        let ordering = left
            .compare(right)
            .unwrap_or_else(|| sort_rank(left).cmp(&sort_rank(right)));
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

fn sort_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Attribute(Scalar::Boolean(_)) => 1,
        Value::Attribute(Scalar::Integer(_)) => 2,
        Value::Attribute(Scalar::Double(_)) => 3,
        Value::Attribute(Scalar::Date(_)) => 4,
        Value::Attribute(Scalar::String(_)) => 5,
        Value::Attribute(Scalar::Binary(_)) => 6,
        Value::Attribute(Scalar::Transformable(_)) => 7,
        Value::Relationship(Reference::ToOne(_)) => 8,
        Value::Relationship(Reference::ToMany(_)) => 9,
    }
}

// ============================================================================
// FetchRequest
// ============================================================================

/// Declarative query description
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Entity to query
    pub entity: String,
    /// Filter; `None` matches everything
    pub predicate: Option<Predicate>,
    /// Ordering instructions, most significant first
    pub sort: Vec<SortDescriptor>,
    /// Whether instances of subentities are included
    pub include_subentities: bool,
    /// Maximum number of results; 0 is unbounded
    pub limit: usize,
    /// Number of leading results to skip
    pub offset: usize,
}

impl FetchRequest {
    /// Fetch every instance of `entity` (subentities included)
    pub fn new(entity: impl Into<String>) -> Self {
        FetchRequest {
            entity: entity.into(),
            predicate: None,
            sort: Vec::new(),
            include_subentities: true,
            limit: 0,
            offset: 0,
        }
    }

    /// Set the filter predicate
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Append a sort instruction
    pub fn sort_by(mut self, descriptor: SortDescriptor) -> Self {
        self.sort.push(descriptor);
        self
    }

    /// Include or exclude subentity instances
    pub fn include_subentities(mut self, include: bool) -> Self {
        self.include_subentities = include;
        self
    }

    /// Cap the result count (0 = unbounded)
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Skip leading results
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Check the predicate and sort instructions against `entity`
    ///
    /// # Errors
    ///
    /// Returns `Query` for a malformed predicate or sort descriptor.
    pub fn check(&self, entity: &Entity) -> StoreResult<()> {
        if let Some(predicate) = &self.predicate {
            predicate.check(entity)?;
        }
        self.sort.iter().try_for_each(|s| s.check(entity))
    }

    /// Compare two values objects by every sort descriptor in turn
    pub fn compare(&self, a: &ValuesObject, b: &ValuesObject) -> Ordering {
        self.sort
            .iter()
            .map(|descriptor| descriptor.compare(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Apply offset and limit to an already ordered result
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        if self.limit == 0 {
            iter.collect()
        } else {
            iter.take(self.limit).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Relationship};

    fn person() -> Entity {
        Entity::new("Person")
            .with_attribute(Attribute::string("name"))
            .with_attribute(Attribute::integer("age").optional())
            .with_relationship(Relationship::to_many("friends", "Person").optional())
            .with_relationship(Relationship::to_one("manager", "Person").optional())
    }

    fn alice() -> ValuesObject {
        ValuesObject::new()
            .with("name", "Alice")
            .with("age", 30i64)
            .with("friends", Value::to_many(["p2", "p3"]))
    }

    #[test]
    fn test_comparison_predicates() {
        let values = alice();
        assert!(Predicate::eq("name", "Alice").evaluate(&values));
        assert!(Predicate::ne("name", "Bob").evaluate(&values));
        assert!(Predicate::gt("age", 18i64).evaluate(&values));
        assert!(Predicate::le("age", 30i64).evaluate(&values));
        assert!(!Predicate::lt("age", 30i64).evaluate(&values));
    }

    #[test]
    fn test_absent_key_evaluates_as_null() {
        let values = alice();
        assert!(Predicate::is_null("manager").evaluate(&values));
        assert!(Predicate::eq("manager", Value::Null).evaluate(&values));
        assert!(!Predicate::gt("manager", Value::to_one("p1")).evaluate(&values));
    }

    #[test]
    fn test_contains_predicates() {
        let values = alice();
        assert!(Predicate::contains("name", "lic").evaluate(&values));
        assert!(Predicate::contains("friends", "p3").evaluate(&values));
        assert!(!Predicate::contains("friends", "p4").evaluate(&values));
    }

    #[test]
    fn test_boolean_combinators() {
        let values = alice();
        let p = Predicate::eq("name", "Alice").and(Predicate::lt("age", 18i64));
        assert!(!p.evaluate(&values));
        let p = Predicate::eq("name", "Bob").or(Predicate::gt("age", 18i64));
        assert!(p.evaluate(&values));
        assert!(Predicate::eq("name", "Bob").not().evaluate(&values));
    }

    #[test]
    fn test_check_rejects_unknown_property() {
        let err = Predicate::eq("email", "a@b.c").check(&person()).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_check_rejects_kind_mismatch() {
        assert!(Predicate::eq("age", "thirty").check(&person()).is_err());
        assert!(Predicate::eq("age", 30.0f64).check(&person()).is_err());
        assert!(Predicate::gt("manager", Value::to_one("p1"))
            .check(&person())
            .is_err());
        assert!(Predicate::contains("age", "3").check(&person()).is_err());
        assert!(Predicate::eq("manager", Value::to_one("p1"))
            .check(&person())
            .is_ok());
        assert!(Predicate::eq("age", Value::Null).check(&person()).is_ok());
    }

    #[test]
    fn test_sort_nulls_first_ascending() {
        let with_age = ValuesObject::new().with("age", 5i64);
        let without = ValuesObject::new();
        let asc = SortDescriptor::ascending("age");
        assert_eq!(asc.compare(&without, &with_age), Ordering::Less);
        let desc = SortDescriptor::descending("age");
        assert_eq!(desc.compare(&without, &with_age), Ordering::Greater);
    }

    #[test]
    fn test_multi_key_ordering() {
        let request = FetchRequest::new("Person")
            .sort_by(SortDescriptor::ascending("age"))
            .sort_by(SortDescriptor::descending("name"));
        let a = ValuesObject::new().with("age", 30i64).with("name", "Alice");
        let b = ValuesObject::new().with("age", 30i64).with("name", "Bob");
        assert_eq!(request.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_paginate() {
        let request = FetchRequest::new("Person").offset(1).limit(2);
        assert_eq!(request.paginate(vec![1, 2, 3, 4]), vec![2, 3]);
        let unbounded = FetchRequest::new("Person").offset(2);
        assert_eq!(unbounded.paginate(vec![1, 2, 3, 4]), vec![3, 4]);
        let past_end = FetchRequest::new("Person").offset(10);
        assert!(past_end.paginate(vec![1, 2]).is_empty());
    }

    #[test]
    fn test_request_check_covers_sort() {
        let request = FetchRequest::new("Person").sort_by(SortDescriptor::ascending("height"));
        assert!(request.check(&person()).is_err());
    }
}
