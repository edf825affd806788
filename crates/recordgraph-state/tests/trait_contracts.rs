//! Trait contract tests for RecordStore.
//!
//! Each contract runs against the in-memory fake and the SurrealDB store
//! (in-memory engine). Any conforming implementation must pass these.

use recordgraph_state::fakes::MemoryRecordStore;
use recordgraph_state::{JsonMap, Query, RecordStore, StoreError, SurrealRecordStore, Value};
use serde_json::json;

fn payload(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("payload must be an object"),
    }
}

async fn contract_insert_assigns_identity(store: &dyn RecordStore) {
    let a = store
        .insert("Author", payload(json!({"name": "Jo"})))
        .await
        .unwrap();
    let b = store
        .insert("Author", payload(json!({"name": "Amy"})))
        .await
        .unwrap();

    assert_eq!(a.class_name, "Author");
    assert!(!a.object_id.is_empty());
    assert_ne!(a.object_id, b.object_id);
    assert_eq!(a.created_at, a.updated_at);
}

async fn contract_get_round_trip(store: &dyn RecordStore) {
    let created = store
        .insert(
            "Author",
            payload(json!({"name": "Jo", "age": 41, "tags": ["a", "b"]})),
        )
        .await
        .unwrap();
    let fetched = store.get("Author", &created.object_id).await.unwrap();

    assert_eq!(fetched.object_id, created.object_id);
    assert_eq!(fetched.fields.get("name"), Some(&json!("Jo")));
    assert_eq!(fetched.fields.get("age"), Some(&json!(41)));
    assert_eq!(fetched.fields.get("tags"), Some(&json!(["a", "b"])));
}

async fn contract_update_replaces_payload(store: &dyn RecordStore) {
    let created = store
        .insert("Author", payload(json!({"name": "Jo", "age": 41})))
        .await
        .unwrap();
    let updated = store
        .update(
            "Author",
            &created.object_id,
            payload(json!({"name": "Jo", "age": 42})),
        )
        .await
        .unwrap();

    assert_eq!(updated.object_id, created.object_id);
    assert!(updated.updated_at >= created.updated_at);

    let fetched = store.get("Author", &created.object_id).await.unwrap();
    assert_eq!(fetched.fields.get("age"), Some(&json!(42)));
}

async fn contract_update_missing_fails(store: &dyn RecordStore) {
    let err = store
        .update("Author", "does-not-exist", JsonMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound { .. }));
}

async fn contract_find_filters_by_class_and_field(store: &dyn RecordStore) {
    store
        .insert("Author", payload(json!({"name": "Jo"})))
        .await
        .unwrap();
    store
        .insert("Author", payload(json!({"name": "Amy"})))
        .await
        .unwrap();
    store
        .insert("Book", payload(json!({"name": "Jo"})))
        .await
        .unwrap();

    let query = Query::new("Author").where_equal_to("name", "Jo");
    let rows = store.find(&query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].class_name, "Author");
    assert_eq!(rows[0].fields.get("name"), Some(&json!("Jo")));

    let none = Query::new("Author").where_equal_to("name", "Nobody");
    assert!(store.find(&none).await.unwrap().is_empty());
}

async fn contract_find_integer_constraint(store: &dyn RecordStore) {
    store
        .insert("Book", payload(json!({"isbn": "x", "genre": 2})))
        .await
        .unwrap();
    let query = Query::new("Book").where_equal_to("genre", Value::Integer(2));
    assert_eq!(store.find(&query).await.unwrap().len(), 1);
}

async fn contract_find_respects_limit_and_order(store: &dyn RecordStore) {
    for i in 0..3 {
        store
            .insert("Book", payload(json!({"shelf": "A", "n": i})))
            .await
            .unwrap();
    }
    let query = Query::new("Book").where_equal_to("shelf", "A").limit(2);
    let rows = store.find(&query).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fields.get("n"), Some(&json!(0)));
    assert_eq!(rows[1].fields.get("n"), Some(&json!(1)));
}

async fn contract_delete_removes_record(store: &dyn RecordStore) {
    let created = store
        .insert("Author", payload(json!({"name": "Jo"})))
        .await
        .unwrap();
    store.delete("Author", &created.object_id).await.unwrap();

    let err = store.get("Author", &created.object_id).await.unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound { .. }));

    // Deleting again is a no-op
    store.delete("Author", &created.object_id).await.unwrap();
}

async fn run_all(store: &dyn RecordStore) {
    contract_insert_assigns_identity(store).await;
    contract_get_round_trip(store).await;
    contract_update_replaces_payload(store).await;
    contract_update_missing_fails(store).await;
    contract_delete_removes_record(store).await;
}

#[tokio::test]
async fn memory_store_satisfies_contracts() {
    run_all(&MemoryRecordStore::new()).await;
}

#[tokio::test]
async fn memory_store_find_contracts() {
    contract_find_filters_by_class_and_field(&MemoryRecordStore::new()).await;
    contract_find_integer_constraint(&MemoryRecordStore::new()).await;
    contract_find_respects_limit_and_order(&MemoryRecordStore::new()).await;
}

#[tokio::test]
async fn surreal_store_satisfies_contracts() {
    let store = SurrealRecordStore::in_memory().await.unwrap();
    run_all(&store).await;
}

#[tokio::test]
async fn surreal_store_find_contracts() {
    contract_find_filters_by_class_and_field(&SurrealRecordStore::in_memory().await.unwrap())
        .await;
    contract_find_integer_constraint(&SurrealRecordStore::in_memory().await.unwrap()).await;
    contract_find_respects_limit_and_order(&SurrealRecordStore::in_memory().await.unwrap())
        .await;
}

#[tokio::test]
async fn memory_store_counts_operations() {
    let store = MemoryRecordStore::new();
    let created = store.insert("Author", JsonMap::new()).await.unwrap();
    store
        .update("Author", &created.object_id, JsonMap::new())
        .await
        .unwrap();
    store.find(&Query::new("Author")).await.unwrap();

    assert_eq!(store.insert_count(), 1);
    assert_eq!(store.update_count(), 1);
    assert_eq!(store.write_count(), 2);
    assert_eq!(store.query_count(), 1);
    assert_eq!(store.count_of("Author"), 1);
}

#[tokio::test]
async fn memory_store_injected_failure() {
    let store = MemoryRecordStore::new();
    store.fail_commits_for("Book");

    let err = store.insert("Book", JsonMap::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::Injected { .. }));
    assert!(store.insert("Author", JsonMap::new()).await.is_ok());
}

#[tokio::test]
async fn surreal_store_on_disk_satisfies_contracts() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("surrealkv://{}", dir.path().join("db").display());
    let store = SurrealRecordStore::connect(&recordgraph_state::StoreConfig::url(url))
        .await
        .unwrap();
    run_all(&store).await;
}
