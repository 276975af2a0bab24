//! Filtered, paginated reads over the memory store.
//!
//! Translates page/size/month/tag-label parameters into a structured
//! store filter and shapes the results for rendering. Tag filtering uses
//! OR semantics: a record matches when it carries at least one of the
//! requested tags.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Memory, MemoryStatus};
use crate::store::{MemoryFilter, MemoryStore};

use super::insights::normalize_whitespace;
use super::pipeline::resolve_tags;
use super::MemoryError;

const MAX_SNIPPET_LENGTH: usize = 180;
const MAX_PAGE_SIZE: i64 = 100;

/// One row in a memory listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryListItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub status: MemoryStatus,
    pub title: Option<String>,
    pub transcript_snippet: String,
    pub tags: Vec<String>,
}

/// A page of memory listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPage {
    pub items: Vec<MemoryListItem>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// Full detail view of one memory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDetail {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub status: MemoryStatus,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub transcript: Option<String>,
    pub error_message: Option<String>,
    pub tags: Vec<String>,
}

impl MemoryDetail {
    pub fn from_memory(memory: &Memory) -> Self {
        Self {
            id: memory.id,
            created_at: memory.created_at,
            recorded_at: memory.recorded_at,
            status: memory.status,
            title: memory.title.clone(),
            summary: memory.summary.clone(),
            transcript: memory.transcript.clone(),
            error_message: memory.error_message.clone(),
            tags: memory.tag_labels(),
        }
    }
}

/// Read model over the store, scoped to one owner
pub struct QueryEngine {
    store: Arc<MemoryStore>,
    owner_id: Uuid,
}

impl QueryEngine {
    pub fn new(store: Arc<MemoryStore>, owner_id: Uuid) -> Self {
        Self { store, owner_id }
    }

    /// List memories, newest first, with optional month and tag filters
    pub async fn list_memories(
        &self,
        page: i64,
        size: i64,
        month: Option<&str>,
        tag_labels: &[String],
    ) -> Result<MemoryPage, MemoryError> {
        let safe_page = page.max(0) as usize;
        let safe_size = size.clamp(1, MAX_PAGE_SIZE) as usize;

        let mut filter = MemoryFilter::for_owner(self.owner_id);

        if let Some(month) = month.filter(|m| !m.trim().is_empty()) {
            filter.recorded_range = Some(parse_month(month)?);
        }

        filter.tags = resolve_tags(tag_labels)?;

        let slice = self.store.find_page(&filter, safe_page, safe_size).await?;

        let items = slice
            .items
            .iter()
            .map(|memory| MemoryListItem {
                id: memory.id,
                created_at: memory.created_at,
                recorded_at: memory.recorded_at,
                status: memory.status,
                title: memory.title.clone(),
                transcript_snippet: snippet(memory.transcript.as_deref().unwrap_or("")),
                tags: memory.tag_labels(),
            })
            .collect();

        let total_pages = slice.total_elements.div_ceil(safe_size as u64);

        Ok(MemoryPage {
            items,
            page: safe_page,
            size: safe_size,
            total_elements: slice.total_elements,
            total_pages,
        })
    }

    /// Fetch one memory's full detail
    pub async fn get_memory(&self, id: Uuid) -> Result<MemoryDetail, MemoryError> {
        let memory = self
            .store
            .get(self.owner_id, id)
            .await?
            .ok_or(MemoryError::NotFound)?;
        Ok(MemoryDetail::from_memory(&memory))
    }
}

/// Parse `YYYY-MM` into the half-open UTC range `[first, first_of_next)`
pub fn parse_month(month: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), MemoryError> {
    let invalid = || MemoryError::client("Invalid month format. Use YYYY-MM.");

    let (year_str, month_str) = month.trim().split_once('-').ok_or_else(invalid)?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year_str.parse().map_err(|_| invalid())?;
    let month_num: u32 = month_str.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)?;
    let next = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(invalid)?;

    let midnight = NaiveTime::MIN;
    Ok((
        Utc.from_utc_datetime(&first.and_time(midnight)),
        Utc.from_utc_datetime(&next.and_time(midnight)),
    ))
}

/// Length-bounded, whitespace-normalized preview of a transcript
pub fn snippet(transcript: &str) -> String {
    let normalized = normalize_whitespace(transcript);
    if normalized.chars().count() <= MAX_SNIPPET_LENGTH {
        return normalized;
    }
    let truncated: String = normalized.chars().take(MAX_SNIPPET_LENGTH - 3).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_range() {
        let (from, to) = parse_month("2026-02").unwrap();
        assert_eq!(from.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_month_december_rolls_over() {
        let (from, to) = parse_month("2025-12").unwrap();
        assert_eq!(from.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_month_rejects_bad_input() {
        for bad in ["2026", "2026-13", "2026-00", "26-02", "2026-2", "abcd-ef", "2026/02"] {
            let err = parse_month(bad).unwrap_err();
            assert!(matches!(err, MemoryError::Client(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_snippet_short_text_unchanged() {
        assert_eq!(snippet("  hello   world  "), "hello world");
    }

    #[test]
    fn test_snippet_truncates_with_ellipsis() {
        let long = "word ".repeat(100);
        let result = snippet(&long);
        assert_eq!(result.chars().count(), MAX_SNIPPET_LENGTH);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_snippet_exactly_at_limit() {
        let text = "a".repeat(180);
        assert_eq!(snippet(&text), text);
    }
}
