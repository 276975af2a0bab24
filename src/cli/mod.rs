//! Command-line interface for keepsake.
//!
//! Provides commands for capturing voice memories, listing and filtering
//! them, showing details, and editing derived metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::adapters::OpenAiTranscription;
use crate::config;
use crate::core::{insight_generator, MemoryPipeline, MemoryUpdate, NewMemory, QueryEngine};
use crate::store::MemoryStore;

/// keepsake - capture, transcribe, and browse voice memories
#[derive(Parser, Debug)]
#[command(name = "keepsake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a memory from an audio file
    Capture {
        /// Path to the audio file
        file: PathBuf,

        /// When the moment occurred (ISO-8601, defaults to now)
        #[arg(long)]
        recorded_at: Option<String>,

        /// Content type of the audio (guessed from the extension if omitted)
        #[arg(long)]
        content_type: Option<String>,

        /// OpenAI API key (or use OPENAI_API_KEY env)
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// List memories, newest first
    List {
        /// Page number (0-based)
        #[arg(short, long, default_value = "0")]
        page: i64,

        /// Page size
        #[arg(short, long, default_value = "20")]
        size: i64,

        /// Filter by month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Filter by tag label (repeatable; matches any)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Show the full detail of one memory
    Show {
        /// Memory ID (UUID)
        id: String,
    },

    /// Edit a memory's title, transcript, or tags
    Edit {
        /// Memory ID (UUID)
        id: String,

        /// New title (empty string clears it)
        #[arg(long)]
        title: Option<String>,

        /// Replacement transcript (summary and tags are regenerated)
        #[arg(long)]
        transcript: Option<String>,

        /// Replacement tag labels (repeatable; omit to keep or regenerate)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Capture {
                file,
                recorded_at,
                content_type,
                api_key,
            } => execute_capture(file, recorded_at, content_type, api_key).await,
            Commands::List {
                page,
                size,
                month,
                tags,
            } => execute_list(page, size, month, tags).await,
            Commands::Show { id } => execute_show(id).await,
            Commands::Edit {
                id,
                title,
                transcript,
                tags,
            } => execute_edit(id, title, transcript, tags).await,
            Commands::Config => execute_config().await,
        }
    }
}

/// Open the store and bootstrap the default owner (idempotent)
async fn open_store() -> Result<(Arc<MemoryStore>, Uuid)> {
    let cfg = config::config()?;
    let store = Arc::new(MemoryStore::open_default().await?);
    let owner = store.ensure_owner(cfg.default_owner_id).await?;
    Ok((store, owner.id))
}

fn build_pipeline(
    store: Arc<MemoryStore>,
    owner_id: Uuid,
    api_key: Option<String>,
) -> Result<MemoryPipeline> {
    let cfg = config::config()?;

    let mut transcription = cfg.transcription.clone();
    let mut insight_settings = cfg.insights.clone();
    if let Some(key) = api_key {
        transcription.api_key = Some(key.clone());
        insight_settings.api_key = Some(key);
    }

    let gateway = Arc::new(OpenAiTranscription::new(&transcription));
    let insights = insight_generator(&insight_settings);
    Ok(MemoryPipeline::new(store, gateway, insights, owner_id))
}

async fn execute_capture(
    file: PathBuf,
    recorded_at: Option<String>,
    content_type: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let audio = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read audio file: {}", file.display()))?;

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    let recorded_at = recorded_at
        .map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid recorded-at timestamp: {}", value))
        })
        .transpose()?;

    let content_type = content_type.or_else(|| guess_content_type(&file));

    let (store, owner_id) = open_store().await?;
    let pipeline = build_pipeline(store, owner_id, api_key)?;

    println!("🎙️  Capturing: {}", file.display());

    let outcome = pipeline
        .create_memory(NewMemory {
            audio,
            filename,
            content_type,
            recorded_at,
        })
        .await?;

    println!();
    println!("Memory {}", outcome.id);
    println!("  Status:  {}", outcome.status);
    if let Some(ref title) = outcome.title {
        println!("  Title:   {}", title);
    }
    if let Some(ref summary) = outcome.summary {
        println!("  Summary: {}", summary);
    }
    if !outcome.tags.is_empty() {
        println!("  Tags:    {}", outcome.tags.join(", "));
    }
    if !outcome.transcript_preview.is_empty() {
        println!("  Preview: {}", outcome.transcript_preview);
    }
    if let Some(ref error) = outcome.error_message {
        println!("  Error:   {}", error);
    }

    Ok(())
}

async fn execute_list(
    page: i64,
    size: i64,
    month: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let (store, owner_id) = open_store().await?;
    let engine = QueryEngine::new(store, owner_id);

    let result = engine
        .list_memories(page, size, month.as_deref(), &tags)
        .await?;

    if result.items.is_empty() {
        println!("No memories found");
        return Ok(());
    }

    println!();
    println!(
        "{:<38} {:<8} {:<20} {:<30} {:<24}",
        "ID", "STATUS", "RECORDED", "TITLE", "TAGS"
    );
    println!("{}", "-".repeat(120));

    for item in &result.items {
        let title = item.title.as_deref().unwrap_or("-");
        let title = if title.chars().count() > 28 {
            format!("{}...", title.chars().take(25).collect::<String>())
        } else {
            title.to_string()
        };

        println!(
            "{:<38} {:<8} {:<20} {:<30} {:<24}",
            item.id,
            item.status.to_string(),
            item.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            title,
            item.tags.join(", ")
        );
    }

    println!();
    println!(
        "Page {} of {} ({} total)",
        result.page + 1,
        result.total_pages.max(1),
        result.total_elements
    );

    Ok(())
}

async fn execute_show(id: String) -> Result<()> {
    let id = parse_id(&id)?;
    let (store, owner_id) = open_store().await?;
    let engine = QueryEngine::new(store, owner_id);

    let detail = engine.get_memory(id).await?;

    println!();
    println!("Memory {}", detail.id);
    println!("══════════════════════════════════════════════════════════════");
    println!("  Status:      {}", detail.status);
    println!("  Created:     {}", detail.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Recorded:    {}", detail.recorded_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(ref title) = detail.title {
        println!("  Title:       {}", title);
    }
    if let Some(ref summary) = detail.summary {
        println!("  Summary:     {}", summary);
    }
    if !detail.tags.is_empty() {
        println!("  Tags:        {}", detail.tags.join(", "));
    }
    if let Some(ref error) = detail.error_message {
        println!("  Error:       {}", error);
    }
    if let Some(ref transcript) = detail.transcript {
        println!();
        println!("Transcript:");
        println!("{}", transcript);
    }

    Ok(())
}

async fn execute_edit(
    id: String,
    title: Option<String>,
    transcript: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<()> {
    let id = parse_id(&id)?;
    let (store, owner_id) = open_store().await?;
    let pipeline = build_pipeline(store, owner_id, None)?;

    let detail = pipeline
        .update_memory(
            id,
            MemoryUpdate {
                title,
                transcript,
                tags,
            },
        )
        .await?;

    println!("✅ Updated memory {}", detail.id);
    if let Some(ref title) = detail.title {
        println!("  Title:   {}", title);
    }
    if let Some(ref summary) = detail.summary {
        println!("  Summary: {}", summary);
    }
    if !detail.tags.is_empty() {
        println!("  Tags:    {}", detail.tags.join(", "));
    }

    Ok(())
}

async fn execute_config() -> Result<()> {
    let cfg = config::config()?;

    println!();
    println!("keepsake Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("Home:             {}", cfg.home.display());
    println!("Store:            {}", config::store_dir()?.display());
    println!("Default owner:    {}", cfg.default_owner_id);
    if let Some(ref path) = cfg.config_file {
        println!("Config file:      {}", path.display());
    }
    println!();
    println!("Transcription:");
    println!("  Base URL:       {}", cfg.transcription.base_url);
    println!("  Model:          {}", cfg.transcription.model);
    println!(
        "  API key:        {}",
        if cfg.transcription.api_key.is_some() { "configured" } else { "not set" }
    );
    println!();
    println!("Insights:");
    println!("  Enabled:        {}", cfg.insights.enabled);
    println!("  Base URL:       {}", cfg.insights.base_url);
    println!("  Model:          {}", cfg.insights.model);
    println!(
        "  API key:        {}",
        if cfg.insights.api_key.is_some() { "configured" } else { "not set" }
    );

    Ok(())
}

fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid memory id: {}", value))
}

/// Guess an audio content type from the file extension
fn guess_content_type(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    let mime = match ext.as_str() {
        "webm" => "audio/webm",
        "m4a" | "mp4" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime.to_string())
}
