//! Validation engine
//!
//! Checks a [`ValuesObject`] against an [`Entity`], consulting an
//! [`ExistenceCheck`] for relationship references. For each key present:
//!
//! 1. Resolve against attributes, then relationships (`UnknownProperty`)
//! 2. Null is only accepted for optional properties (`RequiredValueMissing`)
//! 3. A scalar must be bound to an attribute of exactly its kind (`TypeMismatch`)
//! 4. A reference must be bound to a relationship of matching cardinality
//!    (`CardinalityMismatch`), and every identifier must exist as an instance
//!    of the destination entity (`DanglingReference`): one `exists` call for
//!    to-one, one batched `exist_all` call for to-many
//!
//! Declared properties absent from the values object are not inspected
//! under [`ValidationPolicy::Permissive`], which is what partial updates
//! need. [`ValidationPolicy::Strict`] additionally requires every
//! non-optional property to be present.
//!
//! Keys are checked in name order and the first failure is reported.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ValidationError, ValidationResult};
use crate::resource::Resource;
use crate::schema::{Attribute, Cardinality, Entity, Property, Relationship};
use crate::traits::ExistenceCheck;
use crate::value::{Reference, Scalar, Value, ValuesObject};

/// Whether absent declared properties are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Only keys present in the values object are checked
    #[default]
    Permissive,
    /// Non-optional properties must also be present
    Strict,
}

/// Validation engine bound to an existence oracle
#[derive(Debug, Clone)]
pub struct Validator<E> {
    existence: E,
    policy: ValidationPolicy,
}

impl<E: ExistenceCheck> Validator<E> {
    /// Create a permissive validator
    pub fn new(existence: E) -> Self {
        Validator {
            existence,
            policy: ValidationPolicy::Permissive,
        }
    }

    /// Change the policy
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active policy
    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Validate `values` against `entity`
    ///
    /// # Errors
    ///
    /// Returns the first failure found; a store failure during an existence
    /// check is carried unchanged in `ValidationError::Store`.
    pub fn validate(&self, values: &ValuesObject, entity: &Entity) -> ValidationResult<()> {
        debug!(
            entity = entity.name(),
            keys = values.len(),
            policy = ?self.policy,
            "validating values"
        );

        for (key, value) in values.iter() {
            let property = entity
                .property(key)
                .ok_or_else(|| ValidationError::UnknownProperty {
                    entity: entity.name().to_string(),
                    property: key.to_string(),
                })?;
            self.validate_property(entity, property, value)?;
        }

        if self.policy == ValidationPolicy::Strict {
            if let Some(missing) = missing_required(values, entity).into_iter().next() {
                return Err(ValidationError::RequiredValueMissing {
                    entity: entity.name().to_string(),
                    property: missing.to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_property(
        &self,
        entity: &Entity,
        property: Property<'_>,
        value: &Value,
    ) -> ValidationResult<()> {
        trace!(property = property.name(), kind = value.kind_name(), "checking property");
        match (property, value) {
            (property, Value::Null) => {
                if property.is_optional() {
                    Ok(())
                } else {
                    Err(ValidationError::RequiredValueMissing {
                        entity: entity.name().to_string(),
                        property: property.name().to_string(),
                    })
                }
            }
            (Property::Attribute(attribute), Value::Attribute(scalar)) => {
                check_scalar(attribute, scalar)
            }
            (Property::Attribute(attribute), Value::Relationship(_)) => {
                Err(ValidationError::CardinalityMismatch {
                    property: attribute.name().to_string(),
                    expected: None,
                    actual: value.kind_name().to_string(),
                })
            }
            (Property::Relationship(relationship), Value::Relationship(reference)) => {
                self.check_reference(relationship, reference)
            }
            (Property::Relationship(relationship), Value::Attribute(_)) => {
                Err(ValidationError::TypeMismatch {
                    property: relationship.name().to_string(),
                    expected: None,
                    actual: value.kind_name().to_string(),
                })
            }
        }
    }

    fn check_reference(
        &self,
        relationship: &Relationship,
        reference: &Reference,
    ) -> ValidationResult<()> {
        let destination = relationship.destination();
        let exists = match (relationship.cardinality(), reference) {
            (Cardinality::ToOne, Reference::ToOne(id)) => {
                trace!(destination, id = id.as_str(), "checking to-one reference");
                self.existence.exists(&Resource::new(destination, id.as_str()))?
            }
            (Cardinality::ToMany, Reference::ToMany(ids)) => {
                trace!(destination, count = ids.len(), "checking to-many references");
                let resources: Vec<Resource> = ids
                    .iter()
                    .map(|id| Resource::new(destination, id.as_str()))
                    .collect();
                self.existence.exist_all(&resources)?
            }
            (expected, _) => {
                return Err(ValidationError::CardinalityMismatch {
                    property: relationship.name().to_string(),
                    expected: Some(expected),
                    actual: Value::Relationship(reference.clone()).kind_name().to_string(),
                })
            }
        };

        if exists {
            Ok(())
        } else {
            Err(ValidationError::DanglingReference {
                property: relationship.name().to_string(),
                destination: destination.to_string(),
                identifiers: reference
                    .identifiers()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
        }
    }
}

/// Validate with the permissive policy
///
/// # Errors
///
/// See [`Validator::validate`].
pub fn validate<E: ExistenceCheck>(
    values: &ValuesObject,
    entity: &Entity,
    existence: E,
) -> ValidationResult<()> {
    Validator::new(existence).validate(values, entity)
}

/// Non-optional properties of `entity` that are absent from `values`
///
/// Null-valued keys are not reported here; they are caught by the
/// per-key check.
pub fn missing_required<'a>(values: &ValuesObject, entity: &'a Entity) -> Vec<&'a str> {
    entity
        .properties()
        .filter(|p| !p.is_optional() && !values.contains_key(p.name()))
        .map(|p| p.name())
        .collect()
}

fn check_scalar(attribute: &Attribute, scalar: &Scalar) -> ValidationResult<()> {
    let mismatch = |actual: String| ValidationError::TypeMismatch {
        property: attribute.name().to_string(),
        expected: Some(attribute.kind()),
        actual,
    };

    if scalar.kind() != attribute.kind() {
        return Err(mismatch(scalar.kind().to_string()));
    }

    if let (Scalar::Transformable(payload), Some(decoder)) = (scalar, attribute.decoder()) {
        if payload.type_name() != decoder.type_name() {
            return Err(mismatch(format!("transformable '{}'", payload.type_name())));
        }
    }

    Ok(())
}
