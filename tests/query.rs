//! Query Integration Tests
//!
//! Exercises listing with month and tag filters, pagination clamping, and
//! detail lookups against a seeded store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use keepsake::core::{MemoryError, QueryEngine};
use keepsake::domain::{Memory, MemoryStatus, MemoryTag};
use keepsake::store::MemoryStore;

fn test_engine() -> (QueryEngine, Arc<MemoryStore>, Uuid, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new(temp.path().to_path_buf()));
    let owner_id = Uuid::new_v4();
    let engine = QueryEngine::new(store.clone(), owner_id);
    (engine, store, owner_id, temp)
}

async fn seed(
    store: &MemoryStore,
    owner: Uuid,
    recorded_at: &str,
    transcript: &str,
    tags: &[MemoryTag],
) -> Memory {
    let recorded_at: DateTime<Utc> = recorded_at.parse().unwrap();
    let mut memory = Memory::provisional(Uuid::new_v4(), owner, recorded_at);
    memory.mark_ready(
        transcript.to_string(),
        tags.iter().copied().collect(),
        "A Title".to_string(),
        "A summary.".to_string(),
    );
    store.insert(&memory).await.unwrap();
    memory
}

#[tokio::test]
async fn test_list_newest_first() {
    let (engine, store, owner, _temp) = test_engine();

    let mut ids = Vec::new();
    for day in ["01", "02", "03"] {
        let memory = seed(
            &store,
            owner,
            &format!("2026-02-{}T10:00:00Z", day),
            "words",
            &[MemoryTag::Growth],
        )
        .await;
        ids.push(memory.id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let page = engine.list_memories(0, 20, None, &[]).await.unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 1);
    // created_at descending, so the last seeded record comes first
    assert_eq!(page.items[0].id, ids[2]);
    assert_eq!(page.items[2].id, ids[0]);
}

#[tokio::test]
async fn test_list_month_and_tag_combined() {
    let (engine, store, owner, _temp) = test_engine();

    let feb_language = seed(
        &store,
        owner,
        "2026-02-10T09:00:00Z",
        "She said a new word",
        &[MemoryTag::Language],
    )
    .await;
    // Same month, wrong tag
    seed(
        &store,
        owner,
        "2026-02-11T09:00:00Z",
        "Climbed the slide",
        &[MemoryTag::MotorSkills],
    )
    .await;
    // Right tag, wrong month
    seed(
        &store,
        owner,
        "2026-03-01T00:00:00Z",
        "Another new word",
        &[MemoryTag::Language],
    )
    .await;

    let page = engine
        .list_memories(0, 20, Some("2026-02"), &["Language".to_string()])
        .await
        .unwrap();

    assert_eq!(page.total_elements, 1);
    assert_eq!(page.items[0].id, feb_language.id);
}

#[tokio::test]
async fn test_list_tag_filter_is_or() {
    let (engine, store, owner, _temp) = test_engine();

    seed(&store, owner, "2026-02-01T09:00:00Z", "a", &[MemoryTag::Language]).await;
    seed(&store, owner, "2026-02-02T09:00:00Z", "b", &[MemoryTag::Funny]).await;
    seed(&store, owner, "2026-02-03T09:00:00Z", "c", &[MemoryTag::Play]).await;

    let page = engine
        .list_memories(0, 20, None, &["Language".to_string(), "Funny".to_string()])
        .await
        .unwrap();

    assert_eq!(page.total_elements, 2);
}

#[tokio::test]
async fn test_list_clamps_page_and_size() {
    let (engine, store, owner, _temp) = test_engine();

    for day in 10..15 {
        seed(
            &store,
            owner,
            &format!("2026-02-{}T09:00:00Z", day),
            "words",
            &[MemoryTag::Growth],
        )
        .await;
    }

    // Negative page clamps to 0, oversized page size clamps to 100
    let page = engine.list_memories(-3, 1000, None, &[]).await.unwrap();
    assert_eq!(page.page, 0);
    assert_eq!(page.size, 100);
    assert_eq!(page.items.len(), 5);

    // Zero size clamps to 1
    let page = engine.list_memories(0, 0, None, &[]).await.unwrap();
    assert_eq!(page.size, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_pages, 5);
}

#[tokio::test]
async fn test_list_page_past_end_is_empty() {
    let (engine, store, owner, _temp) = test_engine();

    seed(&store, owner, "2026-02-01T09:00:00Z", "words", &[MemoryTag::Growth]).await;

    let page = engine.list_memories(9, 20, None, &[]).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_elements, 1);
}

#[tokio::test]
async fn test_list_rejects_invalid_month() {
    let (engine, _store, _owner, _temp) = test_engine();

    let err = engine
        .list_memories(0, 20, Some("2026-13"), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MemoryError::Client(_)));
    assert_eq!(err.to_string(), "Invalid month format. Use YYYY-MM.");
}

#[tokio::test]
async fn test_list_rejects_unknown_tag() {
    let (engine, _store, _owner, _temp) = test_engine();

    let err = engine
        .list_memories(0, 20, None, &["Sports".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid tag: Sports");
}

#[tokio::test]
async fn test_list_blank_month_means_no_filter() {
    let (engine, store, owner, _temp) = test_engine();

    seed(&store, owner, "2026-02-01T09:00:00Z", "words", &[MemoryTag::Growth]).await;

    let page = engine.list_memories(0, 20, Some("  "), &[]).await.unwrap();
    assert_eq!(page.total_elements, 1);
}

#[tokio::test]
async fn test_list_snippet_is_bounded() {
    let (engine, store, owner, _temp) = test_engine();

    let long_transcript = "word ".repeat(100);
    seed(
        &store,
        owner,
        "2026-02-01T09:00:00Z",
        &long_transcript,
        &[MemoryTag::Growth],
    )
    .await;

    let page = engine.list_memories(0, 20, None, &[]).await.unwrap();
    let snippet = &page.items[0].transcript_snippet;
    assert_eq!(snippet.chars().count(), 180);
    assert!(snippet.ends_with("..."));
}

#[tokio::test]
async fn test_list_accepts_canonical_tag_names() {
    let (engine, store, owner, _temp) = test_engine();

    seed(
        &store,
        owner,
        "2026-02-01T09:00:00Z",
        "He kicked the ball",
        &[MemoryTag::MotorSkills],
    )
    .await;

    // Both the display label and the snake_case name resolve
    for label in ["Motor Skills", "motor_skills"] {
        let page = engine
            .list_memories(0, 20, None, &[label.to_string()])
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1, "label {:?} did not match", label);
    }
}

#[tokio::test]
async fn test_get_memory_detail() {
    let (engine, store, owner, _temp) = test_engine();

    let memory = seed(
        &store,
        owner,
        "2026-02-01T09:00:00Z",
        "She said a new word",
        &[MemoryTag::Language, MemoryTag::Milestone],
    )
    .await;

    let detail = engine.get_memory(memory.id).await.unwrap();

    assert_eq!(detail.id, memory.id);
    assert_eq!(detail.status, MemoryStatus::Ready);
    assert_eq!(detail.transcript.as_deref(), Some("She said a new word"));
    // Labels come out in canonical order
    assert_eq!(detail.tags, vec!["Language", "Milestone"]);
}

#[tokio::test]
async fn test_get_memory_not_found() {
    let (engine, _store, _owner, _temp) = test_engine();

    let err = engine.get_memory(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, MemoryError::NotFound));
    assert_eq!(err.to_string(), "Memory not found");
}

#[tokio::test]
async fn test_get_memory_scoped_to_owner() {
    let (engine, store, _owner, _temp) = test_engine();

    // Seeded under a different owner
    let foreign = seed(
        &store,
        Uuid::new_v4(),
        "2026-02-01T09:00:00Z",
        "words",
        &[MemoryTag::Growth],
    )
    .await;

    let err = engine.get_memory(foreign.id).await.unwrap_err();
    assert!(matches!(err, MemoryError::NotFound));
}
