//! Error types for entitystore
//!
//! Errors are grouped by the layer that raises them:
//! - [`SchemaError`]: building a schema model
//! - [`ValidationError`]: checking a values object against an entity
//! - [`DecodeError`]: interpreting a JSON document against an entity
//! - [`StoreError`]: store contract failures
//!
//! [`Error`] unifies them for callers that mix layers.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

use crate::resource::Resource;
use crate::schema::{AttributeKind, Cardinality};

/// Result type alias for schema construction
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Result type alias for validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type alias for JSON decoding
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias spanning every layer
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Schema
// ============================================================================

/// Errors raised while building a schema model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two entities share a name
    #[error("duplicate entity '{0}'")]
    DuplicateEntity(String),

    /// A property name is declared twice on one entity (including inherited ones)
    #[error("entity '{entity}' declares property '{property}' more than once")]
    DuplicateProperty {
        /// Entity name
        entity: String,
        /// Property name
        property: String,
    },

    /// Parent entity is not declared
    #[error("entity '{entity}' inherits from unknown entity '{parent}'")]
    UnknownParent {
        /// Entity name
        entity: String,
        /// Missing parent name
        parent: String,
    },

    /// Parent chain loops back on itself
    #[error("inheritance cycle through entity '{0}'")]
    InheritanceCycle(String),
}

// ============================================================================
// Validation
// ============================================================================

/// Errors raised by the validation engine
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Values-object key not declared on the entity
    #[error("unknown property '{property}' on entity '{entity}'")]
    UnknownProperty {
        /// Entity name
        entity: String,
        /// Offending key
        property: String,
    },

    /// Null or absent value for a non-optional property
    #[error("required value missing for '{entity}.{property}'")]
    RequiredValueMissing {
        /// Entity name
        entity: String,
        /// Property name
        property: String,
    },

    /// Scalar value that does not fit the declared property
    ///
    /// Raised for a scalar of the wrong kind on an attribute, and for any
    /// scalar bound to a relationship (`expected` is `None`).
    #[error(
        "type mismatch for '{property}': expected {}, got {actual}",
        describe_kind(.expected)
    )]
    TypeMismatch {
        /// Property name
        property: String,
        /// Declared attribute kind, `None` if the property is a relationship
        expected: Option<AttributeKind>,
        /// Description of the value actually supplied
        actual: String,
    },

    /// Reference value that does not fit the declared property
    ///
    /// Raised for a reference of the wrong shape on a relationship, and for
    /// any reference bound to an attribute (`expected` is `None`).
    #[error(
        "cardinality mismatch for '{property}': expected {}, got {actual}",
        describe_cardinality(.expected)
    )]
    CardinalityMismatch {
        /// Property name
        property: String,
        /// Declared cardinality, `None` if the property is an attribute
        expected: Option<Cardinality>,
        /// Description of the value actually supplied
        actual: String,
    },

    /// A referenced resource does not exist
    #[error("dangling reference in '{property}' to {destination} {identifiers:?}")]
    DanglingReference {
        /// Property name
        property: String,
        /// Destination entity name
        destination: String,
        /// Identifiers that were checked
        identifiers: Vec<String>,
    },

    /// The existence check itself failed
    #[error(transparent)]
    Store(Box<StoreError>),
}

fn describe_kind(kind: &Option<AttributeKind>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "a reference".to_string(),
    }
}

fn describe_cardinality(cardinality: &Option<Cardinality>) -> String {
    match cardinality {
        Some(cardinality) => cardinality.to_string(),
        None => "a scalar".to_string(),
    }
}

impl ValidationError {
    /// Property the error is about, if any
    pub fn property(&self) -> Option<&str> {
        match self {
            ValidationError::UnknownProperty { property, .. }
            | ValidationError::RequiredValueMissing { property, .. }
            | ValidationError::TypeMismatch { property, .. }
            | ValidationError::CardinalityMismatch { property, .. }
            | ValidationError::DanglingReference { property, .. } => Some(property),
            ValidationError::Store(_) => None,
        }
    }
}

impl From<StoreError> for ValidationError {
    fn from(e: StoreError) -> Self {
        ValidationError::Store(Box::new(e))
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Errors raised when a JSON document cannot be interpreted against an entity
///
/// Any single failure aborts the whole conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The document is not valid JSON text
    #[error("malformed JSON document: {0}")]
    Malformed(String),

    /// The document or one of its keys has an incompatible shape
    #[error("decode failure for '{property}': {reason}")]
    DecodeFailure {
        /// Property name, or `$document` for the top level
        property: String,
        /// What did not match
        reason: String,
    },
}

impl DecodeError {
    /// Create a decode failure for one property
    pub fn failure(property: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::DecodeFailure {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Errors raised by store contract implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Resource's entity is unknown to the store's schema
    #[error("invalid entity '{0}'")]
    InvalidEntity(String),

    /// Values failed validation; nothing was written
    #[error("invalid values: {0}")]
    InvalidValues(#[source] ValidationError),

    /// Resource does not exist
    #[error("resource not found: {0}")]
    NotFound(Resource),

    /// Resource already exists
    #[error("resource already exists: {0}")]
    AlreadyExists(Resource),

    /// Backend could not be reached or failed internally
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Malformed fetch request
    #[error("query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        StoreError::Query(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        StoreError::Unavailable(msg.into())
    }
}

impl From<ValidationError> for StoreError {
    /// Store failures raised during an existence check are surfaced as-is
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::Store(inner) => *inner,
            other => StoreError::InvalidValues(other),
        }
    }
}

// ============================================================================
// Umbrella
// ============================================================================

/// Any entitystore error
#[derive(Debug, Error)]
pub enum Error {
    /// Schema construction error
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON decode error
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}
