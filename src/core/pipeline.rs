//! Memory creation and update pipeline.
//!
//! Creation is a sequential state machine: a provisional record is
//! persisted in `Processing` before transcription starts, so every upload
//! yields a durable, queryable record even if later stages fail. Success
//! finalizes it to `Ready` with derived insights and tags; any failure
//! lands it in `Failed` with the captured error message. Exactly two
//! durable writes per creation, and content fields are never written
//! partially.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::TranscriptionGateway;
use crate::domain::{Memory, MemoryStatus, MemoryTag};
use crate::store::MemoryStore;

use super::insights::InsightGenerator;
use super::query::{snippet, MemoryDetail};
use super::{tagging, MemoryError};

const DEFAULT_FILENAME: &str = "recording.webm";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An audio upload to turn into a memory
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub audio: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

/// A partial edit of an existing memory
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    pub title: Option<String>,
    pub transcript: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Result of a creation attempt. Creation itself always succeeds once the
/// input validates; transcription failures are reported through `status`
/// and `error_message`, never as an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryOutcome {
    pub id: Uuid,
    pub status: MemoryStatus,
    pub error_message: Option<String>,
    pub transcript_preview: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

/// Orchestrates memory creation and updates
pub struct MemoryPipeline {
    store: Arc<MemoryStore>,
    gateway: Arc<dyn TranscriptionGateway>,
    insights: Arc<dyn InsightGenerator>,
    owner_id: Uuid,
}

impl MemoryPipeline {
    pub fn new(
        store: Arc<MemoryStore>,
        gateway: Arc<dyn TranscriptionGateway>,
        insights: Arc<dyn InsightGenerator>,
        owner_id: Uuid,
    ) -> Self {
        Self {
            store,
            gateway,
            insights,
            owner_id,
        }
    }

    /// Create a memory from an audio upload
    #[instrument(skip(self, upload), fields(owner = %self.owner_id))]
    pub async fn create_memory(
        &self,
        upload: NewMemory,
    ) -> Result<CreateMemoryOutcome, MemoryError> {
        if upload.audio.is_empty() {
            return Err(MemoryError::client("Audio file is required"));
        }

        let recorded_at = upload.recorded_at.unwrap_or_else(Utc::now);
        let mut memory = Memory::provisional(Uuid::new_v4(), self.owner_id, recorded_at);
        self.store.insert(&memory).await?;
        info!(id = %memory.id, "Provisional memory persisted");

        let filename = upload.filename.as_deref().unwrap_or(DEFAULT_FILENAME);
        let content_type = upload
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        match self
            .gateway
            .transcribe(&upload.audio, filename, content_type)
            .await
        {
            Ok(transcript) => {
                let insights = self.insights.generate(&transcript).await;
                let tags = tagging::detect_tags(&transcript);
                memory.mark_ready(transcript, tags, insights.title, insights.summary);
                info!(id = %memory.id, "Memory ready");
            }
            Err(e) => {
                warn!(id = %memory.id, error = %e, "Transcription failed");
                memory.mark_failed(failure_message(&e));
            }
        }

        self.store.save(&memory).await?;

        Ok(CreateMemoryOutcome {
            id: memory.id,
            status: memory.status,
            error_message: memory.error_message.clone(),
            transcript_preview: snippet(memory.transcript.as_deref().unwrap_or("")),
            title: memory.title.clone(),
            summary: memory.summary.clone(),
            tags: memory.tag_labels(),
        })
    }

    /// Apply a partial edit to an existing memory
    #[instrument(skip(self, update), fields(owner = %self.owner_id, id = %id))]
    pub async fn update_memory(
        &self,
        id: Uuid,
        update: MemoryUpdate,
    ) -> Result<MemoryDetail, MemoryError> {
        let mut memory = self
            .store
            .get(self.owner_id, id)
            .await?
            .ok_or(MemoryError::NotFound)?;

        if let Some(ref title) = update.title {
            memory.update_title(title);
        }

        if let Some(ref labels) = update.tags {
            memory.replace_tags(resolve_tags(labels)?);
        }

        if let Some(ref transcript) = update.transcript {
            let normalized = super::insights::normalize_whitespace(transcript);
            if normalized.is_empty() {
                return Err(MemoryError::client("Transcript must not be empty"));
            }

            let insights = self.insights.generate(&normalized).await;
            memory.update_transcript_and_summary(normalized.clone(), insights.summary);
            // A transcript edit makes the record readable again
            memory.clear_failure();

            let caller_title_blank = update
                .title
                .as_deref()
                .map_or(true, |t| t.trim().is_empty());
            let current_title_blank = memory
                .title
                .as_deref()
                .map_or(true, |t| t.trim().is_empty());
            if caller_title_blank && current_title_blank {
                memory.update_title(&insights.title);
            }

            if update.tags.is_none() {
                memory.replace_tags(tagging::detect_tags(&normalized));
            }
        }

        self.store.save(&memory).await?;
        info!("Memory updated");

        Ok(MemoryDetail::from_memory(&memory))
    }
}

/// Resolve tag labels against the closed enumeration
pub fn resolve_tags(labels: &[String]) -> Result<BTreeSet<MemoryTag>, MemoryError> {
    let mut resolved = BTreeSet::new();
    for label in labels {
        let tag = MemoryTag::from_label(label)
            .ok_or_else(|| MemoryError::client(format!("Invalid tag: {}", label)))?;
        resolved.insert(tag);
    }
    Ok(resolved)
}

/// Message to store on a failed record: the error's own message, or a
/// generic kind name when it is blank
fn failure_message(error: &anyhow::Error) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        "Transcription failed".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tags_case_insensitive() {
        let tags = resolve_tags(&["language".to_string(), "MOTOR_SKILLS".to_string()]).unwrap();
        assert!(tags.contains(&MemoryTag::Language));
        assert!(tags.contains(&MemoryTag::MotorSkills));
    }

    #[test]
    fn test_resolve_tags_unknown_is_client_error() {
        let err = resolve_tags(&["Sports".to_string()]).unwrap_err();
        assert!(matches!(err, MemoryError::Client(_)));
        assert_eq!(err.to_string(), "Invalid tag: Sports");
    }
}
