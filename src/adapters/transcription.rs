//! OpenAI transcription backend.
//!
//! Uploads audio bytes as a multipart form to an OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint and returns the transcript text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::TranscriptionGateway;
use crate::config::TranscriptionSettings;

/// Transcription API response body
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Transcription gateway backed by the OpenAI audio API
pub struct OpenAiTranscription {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiTranscription {
    pub fn new(settings: &TranscriptionSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionGateway for OpenAiTranscription {
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .context("OPENAI_API_KEY is not configured")?;

        let file_part = Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type)
            .with_context(|| format!("Invalid content type: {}", content_type))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcription request failed ({}): {}", status, body.trim());
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("Transcription response was empty");
        }

        Ok(text)
    }
}
