// ==========================
// crates/backend-lib/tests/pages.rs
// ==========================
use backend_lib::archive::ArchiveStore;
use backend_lib::config::WikiSettings;
use backend_lib::pages::PageStore;
use backend_lib::store::MemoryStorage;
use mdwiki_common::PagePatch;

fn title_as_id_settings() -> WikiSettings {
    WikiSettings {
        separate_page_title_and_id: false,
        save_to_archive: true,
        latest_count: 20,
    }
}

#[tokio::test]
async fn test_add_uses_title_as_id_and_rejects_collisions() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());

    let pid = pages
        .add("Release Notes", "initial content", "alice@example.com")
        .await
        .unwrap();
    assert_eq!(pid.as_deref(), Some("Release Notes"));

    // same title, same id: rejected
    let collision = pages
        .add("Release Notes", "other content", "bob@example.com")
        .await
        .unwrap();
    assert_eq!(collision, None);
}

#[tokio::test]
async fn test_add_with_generated_ids_allows_same_title() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(
        &storage,
        WikiSettings {
            separate_page_title_and_id: true,
            ..title_as_id_settings()
        },
    );

    let first = pages.add("Notes", "a", "alice@example.com").await.unwrap().unwrap();
    let second = pages.add("Notes", "b", "alice@example.com").await.unwrap().unwrap();
    assert_ne!(first, second);
    assert_ne!(first, "Notes");
}

#[tokio::test]
async fn test_update_missing_page_returns_none() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());

    let result = pages
        .update("no-such-page", "alice@example.com", &PagePatch::content("x"))
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_update_archives_exactly_one_snapshot() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());
    let archive = ArchiveStore::new(&storage);

    pages
        .add("Runbook", "version one", "alice@example.com")
        .await
        .unwrap();
    assert!(archive.get_by_page("Runbook").await.unwrap().is_empty());

    pages
        .update("Runbook", "bob@example.com", &PagePatch::content("version two"))
        .await
        .unwrap();

    let entries = archive.get_by_page("Runbook").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.content, "version one");
    assert_eq!(entries[0].data.update.by, "alice@example.com");
    assert_eq!(entries[0].page_id, "Runbook");

    let current = pages.get("Runbook").await.unwrap().unwrap();
    assert_eq!(current.content, "version two");
    assert_eq!(current.update.by, "bob@example.com");
    assert_eq!(current.create.by, "alice@example.com");
}

#[tokio::test]
async fn test_update_without_archiving_keeps_archive_empty() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(
        &storage,
        WikiSettings {
            save_to_archive: false,
            ..title_as_id_settings()
        },
    );
    let archive = ArchiveStore::new(&storage);

    pages.add("Scratch", "one", "alice@example.com").await.unwrap();
    pages
        .update("Scratch", "alice@example.com", &PagePatch::content("two"))
        .await
        .unwrap();

    assert!(archive.get_by_page("Scratch").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_title_change_renames_the_record() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());

    pages.add("Old Title", "body", "alice@example.com").await.unwrap();

    let new_pid = pages
        .update("Old Title", "alice@example.com", &PagePatch::title("New Title"))
        .await
        .unwrap();
    assert_eq!(new_pid.as_deref(), Some("New Title"));

    assert!(pages.get("Old Title").await.unwrap().is_none());
    let renamed = pages.get("New Title").await.unwrap().unwrap();
    assert_eq!(renamed.title, "New Title");
    assert_eq!(renamed.content, "body");
    assert_eq!(renamed.create.by, "alice@example.com");
}

#[tokio::test]
async fn test_get_latest_orders_newest_first() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());

    for title in ["First", "Second", "Third"] {
        pages.add(title, "content", "alice@example.com").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    pages
        .update("First", "alice@example.com", &PagePatch::content("bumped"))
        .await
        .unwrap();

    let latest = pages.get_latest(2).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].id, "First");
    assert_eq!(latest[1].id, "Third");
}

#[tokio::test]
async fn test_index_groups_by_uppercased_first_character() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());

    for title in ["apple", "Banana", "avocado"] {
        pages.add(title, "content", "alice@example.com").await.unwrap();
    }

    let index = pages.get_all_as_index().await.unwrap();
    let keys: Vec<&String> = index.keys().collect();
    assert_eq!(keys, ["A", "B"]);

    let a_titles: Vec<&str> = index["A"].iter().map(|p| p.title.as_str()).collect();
    assert_eq!(a_titles, ["apple", "avocado"]);
    let b_titles: Vec<&str> = index["B"].iter().map(|p| p.title.as_str()).collect();
    assert_eq!(b_titles, ["Banana"]);
}

#[tokio::test]
async fn test_archive_purge_is_explicit_only() {
    let storage = MemoryStorage::new();
    let pages = PageStore::new(&storage, title_as_id_settings());
    let archive = ArchiveStore::new(&storage);

    pages.add("Doc", "v1", "alice@example.com").await.unwrap();
    pages
        .update("Doc", "alice@example.com", &PagePatch::content("v2"))
        .await
        .unwrap();
    pages
        .update("Doc", "alice@example.com", &PagePatch::content("v3"))
        .await
        .unwrap();

    let entries = archive.get_by_page("Doc").await.unwrap();
    assert_eq!(entries.len(), 2);

    let aid = entries[0].id.clone();
    assert!(archive.get(&aid).await.unwrap().is_some());
    archive.remove(&aid).await.unwrap();
    assert!(archive.get(&aid).await.unwrap().is_none());
    assert_eq!(archive.get_by_page("Doc").await.unwrap().len(), 1);

    let remaining: Vec<String> = archive
        .get_by_page("Doc")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    archive.remove_many(&remaining).await.unwrap();
    assert!(archive.get_by_page("Doc").await.unwrap().is_empty());
}
