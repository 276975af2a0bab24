//! Title and summary generation from transcripts.
//!
//! Two implementations behind one trait, selected at construction:
//! - `HeuristicInsights`: deterministic local extraction (always available)
//! - `OpenAiInsights`: chat-completion assisted, silently degrading to the
//!   heuristic on any failure (network, parse, empty result)
//!
//! Neither implementation ever returns an error, and neither ever echoes
//! the raw transcript back as title or summary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::InsightSettings;

const MAX_TITLE_LENGTH: usize = 72;
const TITLE_WORD_COUNT: usize = 5;
const QUOTED_PHRASE_MAX_WORDS: usize = 4;
const SHORT_TRANSCRIPT_WORDS: usize = 12;
const SUMMARY_LEAD_WORDS: usize = 18;

const UNTITLED: &str = "Untitled Memory";
const GENERIC_SUMMARY: &str = "A meaningful moment was captured and saved.";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "had", "has", "have", "he",
    "her", "hers", "him", "his", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on", "or",
    "our", "she", "that", "the", "their", "them", "they", "this", "to", "was", "we", "were",
    "with", "you", "your",
];

/// Derived title and summary for a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryInsights {
    pub title: String,
    pub summary: String,
}

/// Generates a title and summary from a transcript. Never fails.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, transcript: &str) -> MemoryInsights;
}

/// Build the configured generator: AI-assisted when enabled and a key is
/// present, heuristic-only otherwise. The caller cannot observe which
/// path ran except through the output itself.
pub fn insight_generator(settings: &InsightSettings) -> Arc<dyn InsightGenerator> {
    if settings.enabled {
        if let Some(api_key) = settings.api_key.clone().filter(|k| !k.trim().is_empty()) {
            return Arc::new(OpenAiInsights::new(
                settings.base_url.clone(),
                settings.model.clone(),
                api_key,
            ));
        }
    }
    Arc::new(HeuristicInsights)
}

// ---------------------------------------------------------------------------
// Heuristic path
// ---------------------------------------------------------------------------

/// Deterministic local title/summary extraction
pub struct HeuristicInsights;

#[async_trait]
impl InsightGenerator for HeuristicInsights {
    async fn generate(&self, transcript: &str) -> MemoryInsights {
        heuristic_insights(transcript)
    }
}

/// Run the heuristic extraction synchronously
pub fn heuristic_insights(transcript: &str) -> MemoryInsights {
    let normalized = normalize_whitespace(transcript);
    if normalized.is_empty() {
        return MemoryInsights {
            title: UNTITLED.to_string(),
            summary: String::new(),
        };
    }

    let words = tokenize(&normalized);
    let title = build_title(&normalized, &words);
    let summary = build_summary(&normalized, &words, &title);

    MemoryInsights { title, summary }
}

fn build_title(transcript: &str, words: &[String]) -> String {
    if let Some(quoted) = quoted_phrase_title(transcript) {
        return finish_title(quoted, transcript);
    }

    let selected: Vec<&str> = words
        .iter()
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .take(TITLE_WORD_COUNT)
        .map(String::as_str)
        .collect();

    // Nothing but stopwords: fall back to the leading raw tokens
    let selected = if selected.is_empty() {
        words
            .iter()
            .take(TITLE_WORD_COUNT)
            .map(String::as_str)
            .collect::<Vec<_>>()
    } else {
        selected
    };

    if selected.is_empty() {
        return UNTITLED.to_string();
    }

    finish_title(title_case(&selected.join(" ")), transcript)
}

/// Cap the title length and guard against echoing the transcript
fn finish_title(title: String, transcript: &str) -> String {
    let capped = cap_length(&title, MAX_TITLE_LENGTH);
    if equals_ignoring_punctuation(&capped, transcript) {
        return UNTITLED.to_string();
    }
    capped
}

/// Look for a short quoted phrase to use as the title. A transcript that
/// mentions "first" wraps it as a first-time moment.
fn quoted_phrase_title(transcript: &str) -> Option<String> {
    let start = transcript.find('"')?;
    let rest = &transcript[start + 1..];
    let end = rest.find('"')?;
    let phrase = rest[..end].trim();

    if phrase.is_empty() || tokenize(phrase).len() > QUOTED_PHRASE_MAX_WORDS {
        return None;
    }

    let cased = title_case(phrase);
    if transcript.to_lowercase().contains("first") {
        Some(format!("First Time Saying '{}'", cased))
    } else {
        Some(cased)
    }
}

fn build_summary(transcript: &str, words: &[String], title: &str) -> String {
    let summary = if words.len() <= SHORT_TRANSCRIPT_WORDS {
        if title.is_empty() {
            GENERIC_SUMMARY.to_string()
        } else {
            format!(
                "A meaningful moment about {} was captured and saved.",
                lower_first(title)
            )
        }
    } else {
        let lead: Vec<&str> = transcript
            .split_whitespace()
            .take(SUMMARY_LEAD_WORDS)
            .collect();
        let truncated = transcript.split_whitespace().count() > SUMMARY_LEAD_WORDS;
        let terminator = if truncated { "..." } else { "." };
        format!("A moment to remember: {}{}", lead.join(" "), terminator)
    };

    if equals_ignoring_punctuation(&summary, transcript)
        || equals_ignoring_punctuation(&summary, title)
    {
        return GENERIC_SUMMARY.to_string();
    }

    summary
}

// ---------------------------------------------------------------------------
// AI-assisted path
// ---------------------------------------------------------------------------

const INSIGHT_SYSTEM_PROMPT: &str = "You write parenting-memory metadata. Return strict JSON with keys title and summary. \
Title: 3-8 words, specific, no trailing punctuation. \
Summary: one concise sentence, max 28 words, paraphrase transcript and do not copy it verbatim. \
Use same language as transcript.";

/// Chat-completion assisted generation with heuristic fallback
pub struct OpenAiInsights {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiInsights {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            // The client timeout is the only bound on this path; failures
            // past it degrade to the heuristic.
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url,
            model,
            api_key,
        }
    }

    async fn generate_with_ai(&self, transcript: &str) -> Option<MemoryInsights> {
        let request = ChatCompletionsRequest {
            model: self.model.clone(),
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: INSIGHT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcript.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;

        let body: ChatCompletionsResponse = response.json().await.ok()?;
        let content = body.choices.into_iter().next()?.message?.content?;
        if content.trim().is_empty() {
            return None;
        }

        let payload: InsightPayload = serde_json::from_str(&content).ok()?;

        let title = sanitize_title(payload.title.as_deref().unwrap_or(""), transcript);
        let summary = sanitize_summary(payload.summary.as_deref().unwrap_or(""), transcript, &title);

        if title.is_empty() || summary.is_empty() {
            return None;
        }

        Some(MemoryInsights { title, summary })
    }
}

#[async_trait]
impl InsightGenerator for OpenAiInsights {
    async fn generate(&self, transcript: &str) -> MemoryInsights {
        let normalized = normalize_whitespace(transcript);
        if normalized.is_empty() {
            return MemoryInsights {
                title: UNTITLED.to_string(),
                summary: String::new(),
            };
        }

        if let Some(insights) = self.generate_with_ai(&normalized).await {
            return insights;
        }

        debug!("insight request failed or was rejected, using heuristic fallback");
        heuristic_insights(&normalized)
    }
}

/// Normalize an AI-provided title: strip wrapping quotes and trailing
/// punctuation, title-case, cap length, reject transcript echoes.
fn sanitize_title(value: &str, transcript: &str) -> String {
    let trimmed = normalize_whitespace(value);
    let stripped = trimmed
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`', '.', ',', '!', '?'])
        .trim();
    if stripped.is_empty() {
        return String::new();
    }

    let title = cap_length(&title_case(stripped), MAX_TITLE_LENGTH);
    if equals_ignoring_punctuation(&title, transcript) {
        return String::new();
    }
    title
}

/// Normalize an AI-provided summary: ensure sentence terminator, reject
/// echoes of the transcript or the title.
fn sanitize_summary(value: &str, transcript: &str, title: &str) -> String {
    let mut summary = normalize_whitespace(value);
    if summary.is_empty() {
        return String::new();
    }

    if !summary.ends_with('.') && !summary.ends_with('!') && !summary.ends_with('?') {
        summary.push('.');
    }

    if equals_ignoring_punctuation(&summary, transcript)
        || equals_ignoring_punctuation(&summary, title)
    {
        return String::new();
    }
    summary
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsightPayload {
    title: Option<String>,
    summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Text helpers (shared with pipeline and query via the crate)
// ---------------------------------------------------------------------------

/// Trim and collapse runs of whitespace to single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased alphanumeric word tokens (apostrophes kept inside words)
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "memory".to_string(),
    }
}

fn cap_length(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let truncated: String = value.chars().take(max - 3).collect();
    format!("{}...", truncated.trim_end())
}

/// Compare two strings ignoring case and all non-alphanumeric characters
fn equals_ignoring_punctuation(left: &str, right: &str) -> bool {
    let strip = |s: &str| -> String {
        s.to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    };
    let left = strip(left);
    let right = strip(right);
    !left.is_empty() && left == right
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_transcript() {
        let insights = heuristic_insights("   ");
        assert_eq!(insights.title, UNTITLED);
        assert_eq!(insights.summary, "");
    }

    #[test]
    fn test_quoted_phrase_title_with_first() {
        let insights = heuristic_insights("She said \"mama\" for the first time today!");
        assert_eq!(insights.title, "First Time Saying 'Mama'");
    }

    #[test]
    fn test_quoted_phrase_title_without_first() {
        let insights = heuristic_insights("He shouted \"more juice\" at breakfast while playing");
        assert_eq!(insights.title, "More Juice");
    }

    #[test]
    fn test_long_quoted_phrase_falls_through() {
        let insights =
            heuristic_insights("She said \"I want to go outside right now\" this morning");
        // Five quoted words: falls through to non-stopword extraction
        assert_ne!(insights.title, "I Want To Go Outside Right Now");
    }

    #[test]
    fn test_fallback_title_skips_stopwords() {
        let insights = heuristic_insights("Today my child stacked four blocks without help.");
        assert_eq!(insights.title, "Today Child Stacked Four Blocks");
    }

    #[test]
    fn test_title_never_echoes_transcript() {
        // Short transcript whose non-stopword tokens cover it entirely
        let insights = heuristic_insights("Blocks tower");
        assert_eq!(insights.title, UNTITLED);
    }

    #[test]
    fn test_title_capped_with_ellipsis() {
        let long_word = "supercalifragilistic".repeat(5);
        let insights = heuristic_insights(&format!("{} and some more words here", long_word));
        assert!(insights.title.chars().count() <= MAX_TITLE_LENGTH);
        assert!(insights.title.ends_with("..."));
    }

    #[test]
    fn test_short_transcript_summary_references_title() {
        let insights = heuristic_insights("Today my child stacked four blocks without help.");
        assert!(insights.summary.contains("today Child Stacked Four Blocks"));
        assert!(insights.summary.starts_with("A meaningful moment about"));
    }

    #[test]
    fn test_long_transcript_summary_truncates() {
        let transcript = (0..40)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let insights = heuristic_insights(&transcript);
        assert!(insights.summary.starts_with("A moment to remember:"));
        assert!(insights.summary.ends_with("..."));
    }

    #[test]
    fn test_summary_never_equals_transcript() {
        let transcript = "She took her first steps across the living room floor today and \
                          everyone cheered loudly for her";
        let insights = heuristic_insights(transcript);
        assert!(!equals_ignoring_punctuation(&insights.summary, transcript));
        assert!(!equals_ignoring_punctuation(&insights.title, transcript));
    }

    #[test]
    fn test_deterministic() {
        let a = heuristic_insights("He climbed the big slide all by himself");
        let b = heuristic_insights("He climbed the big slide all by himself");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitize_title_strips_quotes_and_punctuation() {
        assert_eq!(sanitize_title("\"big day at the park!\"", "unrelated"), "Big Day At The Park");
    }

    #[test]
    fn test_sanitize_title_rejects_echo() {
        assert_eq!(sanitize_title("Big day", "big day!"), "");
    }

    #[test]
    fn test_sanitize_summary_appends_terminator() {
        assert_eq!(
            sanitize_summary("A lovely walk in the park", "unrelated transcript", "Title"),
            "A lovely walk in the park."
        );
    }

    #[test]
    fn test_sanitize_summary_rejects_echoes() {
        assert_eq!(sanitize_summary("same text", "Same text.", "Title"), "");
        assert_eq!(sanitize_summary("the title", "transcript", "The Title"), "");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\t\tc  "), "a b c");
    }

    #[tokio::test]
    async fn test_heuristic_generator_trait() {
        let generator = HeuristicInsights;
        let insights = generator.generate("She danced around the kitchen").await;
        assert!(!insights.title.is_empty());
        assert!(!insights.summary.is_empty());
    }
}
