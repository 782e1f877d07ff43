//! A `Person` with a required name and optional to-many `friends`.

use crate::common::*;
use entitystore::{validate, Validator};

#[test]
fn omitted_optional_relationship_validates() {
    let store = shared_store();
    let values = ValuesObject::new().with("name", "Alice");
    assert!(validate(&values, &person_entity(), store.as_ref()).is_ok());
}

#[test]
fn friends_validate_iff_all_exist() {
    let store = shared_store();
    let values = ValuesObject::new()
        .with("name", "Alice")
        .with("friends", Value::to_many(["p2", "p3"]));

    seed_people(&store, &["p2"]);
    let err = validate(&values, &person_entity(), store.as_ref()).unwrap_err();
    assert!(matches!(
        &err,
        ValidationError::DanglingReference { property, .. } if property == "friends"
    ));

    seed_people(&store, &["p3"]);
    assert!(validate(&values, &person_entity(), store.as_ref()).is_ok());
}

#[test]
fn undeclared_key_is_unknown_property() {
    let store = shared_store();
    let values = ValuesObject::new().with("name", "Alice").with("age", 30i64);
    let err = Validator::new(store.as_ref())
        .validate(&values, &person_entity())
        .unwrap_err();
    assert!(matches!(
        err,
        ValidationError::UnknownProperty { property, .. } if property == "age"
    ));
}

#[test]
fn repository_rejects_dangling_friends_without_writing() {
    let store = shared_store();
    let repo = Repository::new(store.clone());
    seed_people(&store, &["p2"]);

    let alice = Resource::new("Person", "p1");
    let err = repo
        .create_from_json(&alice, &json!({"name": "Alice", "friends": ["p2", "p3"]}))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::InvalidValues(ValidationError::DanglingReference { .. }))
    ));
    assert!(matches!(
        repo.values_as_json(&alice),
        Err(Error::Store(StoreError::NotFound(_)))
    ));

    seed_people(&store, &["p3"]);
    repo.create_from_json(&alice, &json!({"name": "Alice", "friends": ["p2", "p3"]}))
        .unwrap();
    assert_eq!(
        repo.values_as_json(&alice).unwrap(),
        json!({"name": "Alice", "friends": ["p2", "p3"]})
    );
}

#[test]
fn friend_order_is_preserved() {
    let store = shared_store();
    let repo = Repository::new(store.clone());
    seed_people(&store, &["a", "b", "c"]);

    let p1 = Resource::new("Person", "p1");
    repo.create_from_json(&p1, &json!({"name": "Alice", "friends": ["c", "a", "b"]}))
        .unwrap();
    assert_eq!(
        repo.values_as_json(&p1).unwrap()["friends"],
        json!(["c", "a", "b"])
    );
}
