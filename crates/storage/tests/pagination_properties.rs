//! Property-based tests for fetch pagination.
//!
//! Walking a sorted request page by page must visit exactly the unpaginated
//! result, in the same order.

use proptest::prelude::*;

use entitystore_core::{
    Attribute, Entity, FetchRequest, Predicate, Resource, Schema, SortDescriptor, Store,
    ValuesObject,
};
use entitystore_storage::MemoryStore;

fn store_with(ages: &[Option<i64>]) -> MemoryStore {
    let schema = Schema::builder()
        .entity(
            Entity::new("Person")
                .with_attribute(Attribute::string("name"))
                .with_attribute(Attribute::integer("age").optional()),
        )
        .build()
        .unwrap();
    let store = MemoryStore::new(schema);
    for (i, age) in ages.iter().enumerate() {
        let mut values = ValuesObject::new().with("name", format!("n{}", i));
        if let Some(age) = age {
            values.insert("age", *age);
        }
        store
            .create(&Resource::new("Person", format!("p{:03}", i)), values)
            .unwrap();
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pages_concatenate_to_full_result(
        ages in prop::collection::vec(prop::option::of(0i64..10), 0..40),
        page_size in 1usize..7,
        descending in any::<bool>(),
    ) {
        let store = store_with(&ages);
        let descriptor = if descending {
            SortDescriptor::descending("age")
        } else {
            SortDescriptor::ascending("age")
        };
        let request = FetchRequest::new("Person").sort_by(descriptor);
        let full = store.fetch(&request).unwrap();
        prop_assert_eq!(full.len(), ages.len());

        let mut walked = Vec::new();
        let mut offset = 0;
        loop {
            let page = store
                .fetch(&request.clone().offset(offset).limit(page_size))
                .unwrap();
            prop_assert!(page.len() <= page_size);
            if page.is_empty() {
                break;
            }
            offset += page.len();
            walked.extend(page);
        }
        prop_assert_eq!(walked, full);
    }

    #[test]
    fn filter_matches_evaluation(
        ages in prop::collection::vec(prop::option::of(0i64..10), 0..30),
        threshold in 0i64..10,
    ) {
        let store = store_with(&ages);
        let request = FetchRequest::new("Person").filter(Predicate::ge("age", threshold));
        let expected = ages
            .iter()
            .filter(|age| matches!(age, Some(a) if *a >= threshold))
            .count();
        prop_assert_eq!(store.fetch(&request).unwrap().len(), expected);
    }
}
