//! Universal resource handle
//!
//! A [`Resource`] names one persisted instance without loading it: the
//! entity it belongs to plus an opaque identifier. Uniqueness and format of
//! identifiers are the store's responsibility.
//!
//! ```
//! use entitystore_core::Resource;
//!
//! let alice = Resource::new("Person", "p1");
//! assert_eq!(alice.entity(), "Person");
//! assert_eq!(alice.to_string(), "Person/p1");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// (entity name, identifier) handle to a persisted instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resource {
    entity: String,
    id: String,
}

impl Resource {
    /// Create a handle from an entity name and identifier
    pub fn new(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Resource {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a handle with a fresh random (UUID v4) identifier
    pub fn generate(entity: impl Into<String>) -> Self {
        Self::new(entity, Uuid::new_v4().to_string())
    }

    /// Entity name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity, self.id)
    }
}
