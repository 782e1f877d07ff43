//! Repository behaviour driven by `entitystore.toml`.

use crate::common::*;
use entitystore::{FetchRequest, SortDescriptor};

#[test]
fn permissive_file_allows_sparse_creates() {
    let (_dir, path) = config_dir("creation_policy = \"permissive\"\n");
    let config = EntityStoreConfig::from_file(&path).unwrap();
    let repo = Repository::with_config(MemoryStore::new(schema()), &config).unwrap();

    let p1 = Resource::new("Person", "p1");
    repo.create_from_json(&p1, &json!({})).unwrap();
    assert_eq!(
        repo.values_as_json(&p1).unwrap(),
        json!({"name": null, "friends": null})
    );
}

#[test]
fn default_file_is_strict() {
    let (_dir, path) = config_dir("");
    std::fs::remove_file(&path).unwrap();
    EntityStoreConfig::write_default_if_missing(&path).unwrap();

    let config = EntityStoreConfig::from_file(&path).unwrap();
    let repo = Repository::with_config(MemoryStore::new(schema()), &config).unwrap();
    let err = repo
        .create_from_json(&Resource::new("Person", "p1"), &json!({}))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::InvalidValues(ValidationError::RequiredValueMissing { .. }))
    ));
}

#[test]
fn fetch_limit_caps_unbounded_requests() {
    let (_dir, path) = config_dir("max_fetch_limit = 2\n");
    let config = EntityStoreConfig::from_file(&path).unwrap();
    let store = MemoryStore::new(schema());
    seed_people(&store, &["a", "b", "c", "d"]);
    let repo = Repository::with_config(store, &config).unwrap();

    let request = FetchRequest::new("Person").sort_by(SortDescriptor::descending("name"));
    let page: Vec<String> = repo
        .fetch(&request)
        .unwrap()
        .into_iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(page, vec!["d", "c"]);
}

#[test]
fn invalid_file_fails_at_load() {
    let (_dir, path) = config_dir("creation_policy = \"whatever\"\n");
    assert!(EntityStoreConfig::from_file(&path).is_err());
}
