//! Project Store Tests
//!
//! Run against the in-memory document store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{NewProject, NewProjectRecord, Project, ProjectPatch};
use crate::repository::{DocumentStore, MemoryDocumentStore, StoreError, StoreResult};
use super::{ProjectStore, SnapshotCache};

/// Holds every `create` until the test releases it
struct GatedDocumentStore {
    inner: MemoryDocumentStore,
    gate: Notify,
}

impl GatedDocumentStore {
    fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            gate: Notify::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for GatedDocumentStore {
    async fn list_ordered_by_created_at_desc(&self) -> StoreResult<Vec<Project>> {
        self.inner.list_ordered_by_created_at_desc().await
    }

    async fn create(&self, record: &NewProjectRecord) -> StoreResult<String> {
        self.gate.notified().await;
        self.inner.create(record).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.inner.delete(id).await
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        self.inner.update(id, patch).await
    }
}

fn site(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        date: "2025-01-01".to_string(),
        day: "Wednesday".to_string(),
        start_date: "2025-01-01".to_string(),
        end_date: "2025-06-01".to_string(),
        contractor: "ACME".to_string(),
        consultant: "BuildCo".to_string(),
    }
}

fn existing(id: &str, name: &str, created_at: i64) -> Project {
    site(name).into_record(created_at).with_id(id.to_string())
}

fn setup() -> (Arc<MemoryDocumentStore>, ProjectStore) {
    let documents = Arc::new(MemoryDocumentStore::new());
    let store = ProjectStore::new(documents.clone());
    (documents, store)
}

#[tokio::test]
async fn test_add_project_uses_issued_id() {
    let (_, store) = setup();

    let created = store.add_project(site("Site A")).await.expect("add failed");

    assert_eq!(created.id, "p1");
    assert!(created.created_at > 0);
    let local = store.get_project("p1").expect("not stored locally");
    assert_eq!(local, created);
    assert_eq!(local.name, "Site A");
    assert_eq!(local.day, "Wednesday");
    assert_eq!(local.end_date, "2025-06-01");
    assert_eq!(local.consultant, "BuildCo");
    assert!(!store.is_busy());
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_successful_adds_have_unique_ids() {
    let (_, store) = setup();

    for i in 0..5 {
        store.add_project(site(&format!("Site {}", i))).await;
    }

    let projects = store.projects();
    assert_eq!(projects.len(), 5);
    let mut ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[tokio::test]
async fn test_failed_add_leaves_list_unchanged() {
    let (documents, store) = setup();
    store.add_project(site("Kept")).await;
    documents.fail_with(Some(StoreError::new("permission denied"))).await;

    assert!(store.add_project(site("Lost")).await.is_none());

    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.error().as_deref(), Some("permission denied"));
    assert!(!store.is_busy());
}

#[tokio::test]
async fn test_opaque_failure_uses_fallback_message() {
    let (documents, store) = setup();
    documents.fail_with(Some(StoreError::opaque())).await;

    store.add_project(site("Lost")).await;
    assert_eq!(store.error().as_deref(), Some("Failed to add project"));

    store.delete_project("p1").await;
    assert_eq!(store.error().as_deref(), Some("Failed to delete project"));
}

#[tokio::test]
async fn test_invalid_project_never_reaches_store() {
    let (documents, store) = setup();
    let project = NewProject {
        start_date: "next week".to_string(),
        ..site("Site A")
    };

    assert!(store.add_project(project).await.is_none());

    assert_eq!(documents.len().await, 0);
    assert!(store.projects().is_empty());
    assert!(store.error().unwrap().contains("startDate"));
}

#[tokio::test]
async fn test_initialize_replaces_list_newest_first() {
    let documents = Arc::new(MemoryDocumentStore::with_projects(vec![
        existing("a", "Oldest", 100),
        existing("c", "Newest", 300),
        existing("b", "Middle", 200),
    ]));
    let store = ProjectStore::new(documents);

    assert!(store.initialize().await);

    let ids: Vec<String> = store.projects().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_failed_initialize_keeps_stale_list() {
    let (documents, store) = setup();
    store.add_project(site("Stale")).await;
    documents.fail_with(Some(StoreError::new("unavailable"))).await;

    assert!(!store.initialize().await);

    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.error().as_deref(), Some("unavailable"));

    documents.fail_with(None).await;
    assert!(store.initialize().await);
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (_, store) = setup();
    let created = store.add_project(site("Doomed")).await.unwrap();

    assert!(store.delete_project(&created.id).await);

    assert!(store.get_project(&created.id).is_none());
    assert!(store.projects().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_an_error() {
    let (_, store) = setup();
    assert!(store.delete_project("missing").await);
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_failed_delete_keeps_project() {
    let (documents, store) = setup();
    let created = store.add_project(site("Survivor")).await.unwrap();
    documents.fail_with(Some(StoreError::new("offline"))).await;

    assert!(!store.delete_project(&created.id).await);

    assert!(store.get_project(&created.id).is_some());
    assert_eq!(store.error().as_deref(), Some("offline"));
}

#[tokio::test]
async fn test_update_changes_only_patched_field() {
    let (_, store) = setup();
    let before = store.add_project(site("Original")).await.unwrap();

    assert!(store.update_project(&before.id, ProjectPatch::new().name("X")).await);

    let after = store.get_project(&before.id).unwrap();
    assert_eq!(after.name, "X");
    assert_eq!(
        Project {
            name: before.name.clone(),
            ..after
        },
        before
    );
}

#[tokio::test]
async fn test_update_missing_locally_is_skipped() {
    let documents = Arc::new(MemoryDocumentStore::with_projects(vec![existing(
        "remote-only",
        "Remote",
        1,
    )]));
    let store = ProjectStore::new(documents.clone());

    assert!(store.update_project("remote-only", ProjectPatch::new().contractor("New Co")).await);

    assert!(store.projects().is_empty());
    assert_eq!(store.error(), None);
    assert_eq!(documents.get("remote-only").await.unwrap().contractor, "New Co");
}

#[tokio::test]
async fn test_failed_update_keeps_local_values() {
    let (documents, store) = setup();
    let created = store.add_project(site("Original")).await.unwrap();
    documents.fail_with(Some(StoreError::new("conflict"))).await;

    assert!(!store.update_project(&created.id, ProjectPatch::new().name("X")).await);

    assert_eq!(store.get_project(&created.id).unwrap().name, "Original");
    assert_eq!(store.error().as_deref(), Some("conflict"));
}

#[tokio::test]
async fn test_new_operation_clears_previous_error() {
    let (documents, store) = setup();
    documents.fail_with(Some(StoreError::new("offline"))).await;
    store.initialize().await;
    assert!(store.error().is_some());

    documents.fail_with(None).await;
    store.add_project(site("Back online")).await;
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let (_, store) = setup();
    let mut rx = store.subscribe();

    store.add_project(site("Observed")).await;

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.projects.len(), 1);
    assert!(!state.is_busy());
}

#[tokio::test]
async fn test_concurrent_deletes_settle_independently() {
    let (_, store) = setup();
    let a = store.add_project(site("A")).await.unwrap();
    let b = store.add_project(site("B")).await.unwrap();
    let c = store.add_project(site("C")).await.unwrap();

    let (first, second) = tokio::join!(store.delete_project(&a.id), store.delete_project(&c.id));

    assert!(first && second);
    let remaining: Vec<String> = store.projects().into_iter().map(|p| p.id).collect();
    assert_eq!(remaining, vec![b.id]);
    assert!(!store.is_busy());
}

#[tokio::test]
async fn test_busy_while_create_is_pending() {
    let documents = Arc::new(GatedDocumentStore::new());
    let store = Arc::new(ProjectStore::new(documents.clone()));
    let mut rx = store.subscribe();

    let task = tokio::spawn({
        let store = store.clone();
        async move { store.add_project(site("Pending")).await }
    });

    rx.wait_for(|s| s.is_busy()).await.unwrap();
    assert!(store.is_busy());
    assert!(store.projects().is_empty());

    documents.gate.notify_one();
    assert!(task.await.unwrap().is_some());

    assert!(!store.is_busy());
    assert_eq!(store.projects().len(), 1);
}

#[tokio::test]
async fn test_overlapping_calls_stay_busy_until_all_settle() {
    let documents = Arc::new(GatedDocumentStore::new());
    let store = Arc::new(ProjectStore::new(documents.clone()));
    let mut rx = store.subscribe();

    let tasks: Vec<_> = ["First", "Second"]
        .into_iter()
        .map(|name| {
            let store = store.clone();
            tokio::spawn(async move { store.add_project(site(name)).await })
        })
        .collect();
    rx.wait_for(|s| s.pending == 2).await.unwrap();

    documents.gate.notify_one();
    rx.wait_for(|s| s.projects.len() == 1).await.unwrap();
    assert!(store.is_busy());

    documents.gate.notify_one();
    for task in tasks {
        assert!(task.await.unwrap().is_some());
    }
    assert!(!store.is_busy());
    assert_eq!(store.projects().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_snapshot_matches_list_after_concurrent_adds() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("project-storage.json");
    let store = Arc::new(ProjectStore::with_cache(
        Arc::new(MemoryDocumentStore::new()),
        SnapshotCache::new(&cache_path),
    ));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.add_project(site(&format!("Site {}", i))).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_some());
    }

    let cached = SnapshotCache::new(&cache_path).load().unwrap().unwrap();
    assert_eq!(store.projects().len(), 32);
    assert_eq!(cached.len(), store.projects().len());
}

#[tokio::test]
async fn test_snapshot_cache_rehydrates() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("project-storage.json");
    let documents = Arc::new(MemoryDocumentStore::new());

    {
        let store = ProjectStore::with_cache(documents.clone(), SnapshotCache::new(&cache_path));
        store.add_project(site("Cached")).await;
    }

    let offline = Arc::new(MemoryDocumentStore::new());
    offline.fail_with(Some(StoreError::new("offline"))).await;
    let store = ProjectStore::with_cache(offline, SnapshotCache::new(&cache_path));

    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].name, "Cached");

    store.initialize().await;
    assert_eq!(store.projects().len(), 1);
}

#[tokio::test]
async fn test_corrupt_snapshot_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("project-storage.json");
    std::fs::write(&cache_path, "not json").unwrap();

    let store = ProjectStore::with_cache(
        Arc::new(MemoryDocumentStore::new()),
        SnapshotCache::new(&cache_path),
    );

    assert!(store.projects().is_empty());
    assert_eq!(store.error(), None);
}

#[test]
fn test_error_setters() {
    let store = ProjectStore::new(Arc::new(MemoryDocumentStore::new()));
    store.set_error("boom");
    assert_eq!(store.error().as_deref(), Some("boom"));
    store.clear_error();
    assert_eq!(store.error(), None);
}
