//! Secondary index for entity-scoped scans
//!
//! Maps each entity name to the resources stored under it, so fetches and
//! polymorphic lookups touch O(entity size) records instead of the whole
//! table.

use std::collections::{BTreeMap, BTreeSet};

use entitystore_core::Resource;

/// Secondary index: entity name → Resources
#[derive(Debug, Default)]
pub struct EntityIndex {
    index: BTreeMap<String, BTreeSet<Resource>>,
}

impl EntityIndex {
    /// Create a new empty EntityIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource under its entity
    pub fn insert(&mut self, resource: Resource) {
        self.index
            .entry(resource.entity().to_string())
            .or_default()
            .insert(resource);
    }

    /// Remove a resource
    ///
    /// Drops the entity entry once its set becomes empty.
    pub fn remove(&mut self, resource: &Resource) {
        if let Some(resources) = self.index.get_mut(resource.entity()) {
            resources.remove(resource);
            if resources.is_empty() {
                self.index.remove(resource.entity());
            }
        }
    }

    /// Resources stored directly under `entity`, in identifier order
    pub fn get(&self, entity: &str) -> impl Iterator<Item = &Resource> {
        self.index.get(entity).into_iter().flatten()
    }

    /// Number of resources stored under `entity`
    pub fn count(&self, entity: &str) -> usize {
        self.index.get(entity).map_or(0, BTreeSet::len)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of entities with at least one resource
    pub fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut index = EntityIndex::new();
        index.insert(Resource::new("Person", "p2"));
        index.insert(Resource::new("Person", "p1"));
        index.insert(Resource::new("Team", "t1"));

        let people: Vec<&str> = index.get("Person").map(Resource::id).collect();
        assert_eq!(people, vec!["p1", "p2"]);
        assert_eq!(index.count("Team"), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_remove_drops_empty_entries() {
        let mut index = EntityIndex::new();
        let resource = Resource::new("Person", "p1");
        index.insert(resource.clone());
        index.remove(&resource);

        assert!(index.is_empty());
        assert_eq!(index.get("Person").count(), 0);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = EntityIndex::new();
        index.insert(Resource::new("Person", "p1"));
        index.insert(Resource::new("Person", "p1"));
        assert_eq!(index.count("Person"), 1);
    }
}
