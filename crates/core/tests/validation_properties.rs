//! Property-based tests for the validation engine and value ordering.

use std::collections::BTreeSet;

use proptest::prelude::*;

use entitystore_core::{
    validate, Attribute, Entity, ExistenceCheck, Relationship, Resource, SortDescriptor,
    StoreResult, ValidationError, Value, ValuesObject,
};

/// Existence oracle over a fixed set of identifiers
struct Known(BTreeSet<String>);

impl ExistenceCheck for Known {
    fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        Ok(self.0.contains(resource.id()))
    }

    fn exist_all(&self, resources: &[Resource]) -> StoreResult<bool> {
        Ok(resources.iter().all(|r| self.0.contains(r.id())))
    }
}

fn person() -> Entity {
    Entity::new("Person")
        .with_attribute(Attribute::string("name"))
        .with_attribute(Attribute::double("score").optional())
        .with_relationship(Relationship::to_many("friends", "Person").optional())
}

fn identifier() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f"]).prop_map(str::to_string)
}

fn score() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        1 => Just(Value::from(f64::NAN)),
        6 => any::<f64>().prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn to_many_valid_iff_every_reference_exists(
        existing in prop::collection::btree_set(identifier(), 0..6),
        friends in prop::collection::vec(identifier(), 0..6),
    ) {
        let all_exist = friends.iter().all(|id| existing.contains(id));
        let values = ValuesObject::new()
            .with("name", "Alice")
            .with("friends", Value::to_many(friends.iter().map(String::as_str)));

        match validate(&values, &person(), Known(existing)) {
            Ok(()) => prop_assert!(all_exist),
            Err(ValidationError::DanglingReference { identifiers, .. }) => {
                prop_assert!(!all_exist);
                prop_assert_eq!(identifiers, friends);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn sort_descriptor_is_a_total_order(scores in prop::collection::vec(score(), 0..24)) {
        let descriptor = SortDescriptor::ascending("score");
        let mut objects: Vec<ValuesObject> = scores
            .into_iter()
            .map(|s| ValuesObject::new().with("score", s))
            .collect();
        objects.sort_by(|a, b| descriptor.compare(a, b));

        for pair in objects.windows(2) {
            prop_assert_ne!(descriptor.compare(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }
        // Nulls lead in ascending order
        let first_non_null = objects
            .iter()
            .position(|o| !o.get_or_null("score").is_null())
            .unwrap_or(objects.len());
        prop_assert!(objects[first_non_null..]
            .iter()
            .all(|o| !o.get_or_null("score").is_null()));
    }
}
