//! Decode extracts declared keys only; validate rejects undeclared ones.

use crate::common::*;
use entitystore::codec::{decode, decode_str};
use entitystore::{validate, DecodeError};

#[test]
fn undeclared_json_key_is_dropped() {
    let values = decode(&json!({"name": "Alice", "age": 30}), &name_only_entity()).unwrap();
    assert_eq!(values, ValuesObject::new().with("name", "Alice"));
}

#[test]
fn same_key_built_by_hand_is_unknown_property() {
    let store = shared_store();
    let values = ValuesObject::new().with("name", "Alice").with("age", 30i64);
    let err = validate(&values, &name_only_entity(), store.as_ref()).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownProperty { .. }));
}

#[test]
fn repository_ignores_undeclared_keys() {
    let repo = repository();
    let p1 = Resource::new("Person", "p1");
    repo.create_from_json(&p1, &json!({"name": "Alice", "age": 30}))
        .unwrap();
    assert_eq!(
        repo.values_as_json(&p1).unwrap(),
        json!({"name": "Alice", "friends": null})
    );
}

#[test]
fn incompatible_shape_aborts_whole_document() {
    let err = decode_str(
        r#"{"name": "Alice", "friends": "p2"}"#,
        &person_entity(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::DecodeFailure { property, .. } if property == "friends"
    ));
}
