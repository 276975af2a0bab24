//! Memory record and its state machine.
//!
//! A memory is created in `Processing`, then moves to exactly one of
//! `Ready` or `Failed`. Failed records carry only an error message;
//! ready records carry only content fields. Creation is the only path
//! into `Processing`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tag::MemoryTag;

/// Error messages are capped before being stored on a failed record
pub const MAX_ERROR_LENGTH: usize = 1000;

/// Processing status of a memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryStatus {
    Processing,
    Ready,
    Failed,
}

impl std::fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// A persisted voice memory with derived metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier, assigned at creation
    pub id: Uuid,

    /// Owning user
    pub owner_id: Uuid,

    /// Set once at first persistence
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,

    /// When the moment occurred (caller-supplied or creation time)
    pub recorded_at: DateTime<Utc>,

    /// Current status
    pub status: MemoryStatus,

    /// Transcript text (present only when ready)
    pub transcript: Option<String>,

    /// Short title (present when ready or user-edited)
    pub title: Option<String>,

    /// One-sentence summary (present when ready)
    pub summary: Option<String>,

    /// Failure message (present only when failed)
    pub error_message: Option<String>,

    /// Topical tags, kept in canonical order
    #[serde(default)]
    pub tags: BTreeSet<MemoryTag>,
}

impl Memory {
    /// Create a provisional record in `Processing` state
    pub fn provisional(id: Uuid, owner_id: Uuid, recorded_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            created_at: now,
            updated_at: now,
            recorded_at,
            status: MemoryStatus::Processing,
            transcript: None,
            title: None,
            summary: None,
            error_message: None,
            tags: BTreeSet::new(),
        }
    }

    /// Transition to `Ready` with all derived content, clearing any error
    pub fn mark_ready(
        &mut self,
        transcript: String,
        tags: BTreeSet<MemoryTag>,
        title: String,
        summary: String,
    ) {
        self.status = MemoryStatus::Ready;
        self.transcript = Some(transcript);
        self.title = Some(title);
        self.summary = Some(summary);
        self.error_message = None;
        self.tags = tags;
        self.touch();
    }

    /// Transition to `Failed`, clearing all content fields
    pub fn mark_failed(&mut self, message: String) {
        self.status = MemoryStatus::Failed;
        self.transcript = None;
        self.title = None;
        self.summary = None;
        self.error_message = Some(truncate_error(&message));
        self.tags.clear();
        self.touch();
    }

    /// Replace the title verbatim (empty clears it)
    pub fn update_title(&mut self, title: &str) {
        let trimmed = title.trim();
        self.title = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.touch();
    }

    /// Replace transcript and summary together
    pub fn update_transcript_and_summary(&mut self, transcript: String, summary: String) {
        self.transcript = Some(transcript);
        self.summary = Some(summary);
        self.touch();
    }

    /// Make the record readable again after an edit supplies content
    pub fn clear_failure(&mut self) {
        self.status = MemoryStatus::Ready;
        self.error_message = None;
        self.touch();
    }

    /// Replace the tag set wholesale
    pub fn replace_tags(&mut self, tags: BTreeSet<MemoryTag>) {
        self.tags = tags;
        self.touch();
    }

    /// Tag labels in canonical order
    pub fn tag_labels(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.label().to_string()).collect()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Owner of memories. One implicit default owner exists per installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        Self {
            id,
            email,
            created_at: Utc::now(),
        }
    }
}

/// Cap an error message at the storage limit (character-based)
fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_LENGTH {
        return message.to_string();
    }
    message.chars().take(MAX_ERROR_LENGTH).collect()
}
