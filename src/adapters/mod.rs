//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the remote services the
//! pipeline depends on, currently audio transcription.

pub mod transcription;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the OpenAI-backed gateway
pub use transcription::OpenAiTranscription;

/// Converts raw audio bytes to text. May fail; the pipeline captures the
/// failure into the record instead of propagating it to the caller.
#[async_trait]
pub trait TranscriptionGateway: Send + Sync {
    async fn transcribe(&self, audio: &[u8], filename: &str, content_type: &str)
        -> Result<String>;
}
