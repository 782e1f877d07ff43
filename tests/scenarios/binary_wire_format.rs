//! Binary attributes travel as standard Base64.

use crate::common::*;
use entitystore::codec::{decode, encode};

#[test]
fn bytes_encode_to_base64() {
    let values = ValuesObject::new().with("avatar", vec![0u8, 1, 2]);
    assert_eq!(encode(&values), json!({"avatar": "AAEC"}));
}

#[test]
fn base64_decodes_to_bytes() {
    let values = decode(&json!({"avatar": "AAEC"}), &document_entity()).unwrap();
    assert_eq!(
        values.get("avatar").and_then(Value::as_bytes),
        Some(&[0u8, 1, 2][..])
    );
}

#[test]
fn bytes_survive_a_store_round_trip() {
    let repo = repository();
    let doc = repo
        .create_new_from_json("Document", &json!({"avatar": "AAEC"}))
        .unwrap();

    let stored = repo.store().values(&doc).unwrap();
    assert_eq!(stored.get("avatar"), Some(&Value::from(vec![0u8, 1, 2])));
    assert_eq!(repo.values_as_json(&doc).unwrap(), json!({"avatar": "AAEC"}));
}
