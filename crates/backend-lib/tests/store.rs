// ==========================
// crates/backend-lib/tests/store.rs
// ==========================
use backend_lib::store::{Filter, FlatFileStorage, MemoryStorage, Storage};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_flat_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
    let pages = storage.pages();

    pages
        .insert_one(json!({ "id": "Alpha", "title": "Alpha", "content": "one" }))
        .await
        .unwrap();
    pages
        .insert_one(json!({ "id": "Beta", "title": "Beta", "content": "two" }))
        .await
        .unwrap();

    let found = pages.find_one(&Filter::id("Alpha")).await.unwrap().unwrap();
    assert_eq!(found["content"], "one");
    assert_eq!(pages.count(&Filter::id("Beta")).await.unwrap(), 1);
    assert_eq!(pages.count(&Filter::id("Gamma")).await.unwrap(), 0);
    assert_eq!(pages.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_flat_file_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
        storage
            .users()
            .insert_one(json!({ "id": "alice@example.com", "name": "Alice" }))
            .await
            .unwrap();
    }

    let reopened = FlatFileStorage::new(temp_dir.path()).unwrap();
    let alice = reopened
        .users()
        .find_one(&Filter::id("alice@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice["name"], "Alice");
}

#[tokio::test]
async fn test_update_one_replaces_and_upserts() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
    let pages = storage.pages();

    pages
        .insert_one(json!({ "id": "Doc", "content": "v1" }))
        .await
        .unwrap();

    pages
        .update_one(&Filter::id("Doc"), json!({ "id": "Doc", "content": "v2" }), false)
        .await
        .unwrap();
    let doc = pages.find_one(&Filter::id("Doc")).await.unwrap().unwrap();
    assert_eq!(doc["content"], "v2");

    // without upsert, a miss changes nothing
    pages
        .update_one(&Filter::id("Ghost"), json!({ "id": "Ghost" }), false)
        .await
        .unwrap();
    assert_eq!(pages.count(&Filter::id("Ghost")).await.unwrap(), 0);

    // with upsert, a miss inserts
    pages
        .update_one(&Filter::id("Ghost"), json!({ "id": "Ghost" }), true)
        .await
        .unwrap();
    assert_eq!(pages.count(&Filter::id("Ghost")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_one_and_delete_many() {
    let storage = MemoryStorage::new();
    let archive = storage.archive();

    for (aid, pid) in [("a1", "Doc"), ("a2", "Doc"), ("a3", "Other")] {
        archive
            .insert_one(json!({ "id": aid, "page_id": pid }))
            .await
            .unwrap();
    }

    assert_eq!(archive.find_many(&Filter::page_id("Doc")).await.unwrap().len(), 2);

    archive.delete_one(&Filter::id("a1")).await.unwrap();
    assert_eq!(archive.find_many(&Filter::page_id("Doc")).await.unwrap().len(), 1);

    archive
        .delete_many(&[Filter::id("a2"), Filter::id("a3")])
        .await
        .unwrap();
    assert!(archive.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_one_returns_first_match_in_insertion_order() {
    let storage = MemoryStorage::new();
    let archive = storage.archive();

    archive
        .insert_one(json!({ "id": "a1", "page_id": "Doc", "seq": 1 }))
        .await
        .unwrap();
    archive
        .insert_one(json!({ "id": "a2", "page_id": "Doc", "seq": 2 }))
        .await
        .unwrap();

    let first = archive
        .find_one(&Filter::page_id("Doc"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first["seq"], 1);
}
