//! Configuration for keepsake.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (KEEPSAKE_HOME, OPENAI_API_KEY)
//! 2. Config file (.keepsake/config.yaml)
//! 3. Defaults (~/.keepsake, OpenAI public endpoints)
//!
//! Config file discovery:
//! - Searches current directory and parents for .keepsake/config.yaml
//! - The home path in the config file is relative to the .keepsake/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

/// The single implicit owner every installation starts with
pub const DEFAULT_OWNER_ID: Uuid = Uuid::from_u128(1);

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub default_owner_id: Option<Uuid>,
    #[serde(default)]
    pub transcription: Option<TranscriptionFileConfig>,
    #[serde(default)]
    pub insights: Option<InsightFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionFileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightFileConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Transcription gateway settings
#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini-transcribe".to_string(),
            api_key: None,
        }
    }
}

/// Insight generation settings
#[derive(Debug, Clone)]
pub struct InsightSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to keepsake home (store + config state)
    pub home: PathBuf,
    /// Owner id all records are scoped to
    pub default_owner_id: Uuid,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Transcription gateway settings
    pub transcription: TranscriptionSettings,
    /// Insight generation settings
    pub insights: InsightSettings,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".keepsake").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".keepsake");

    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Home: env var wins, then config file (relative to .keepsake/), then default
    let home = if let Ok(env_home) = std::env::var("KEEPSAKE_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = file.as_ref().and_then(|f| f.home.as_deref()) {
        let base = config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        resolve_path(base, home_path)
    } else {
        default_home
    };

    let default_owner_id = file
        .as_ref()
        .and_then(|f| f.default_owner_id)
        .unwrap_or(DEFAULT_OWNER_ID);

    let env_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

    let mut transcription = TranscriptionSettings::default();
    if let Some(t) = file.as_ref().and_then(|f| f.transcription.clone()) {
        if let Some(base_url) = t.base_url {
            transcription.base_url = base_url;
        }
        if let Some(model) = t.model {
            transcription.model = model;
        }
        transcription.api_key = t.api_key;
    }
    if transcription.api_key.is_none() {
        transcription.api_key = env_api_key.clone();
    }

    let mut insights = InsightSettings::default();
    if let Some(i) = file.as_ref().and_then(|f| f.insights.clone()) {
        if let Some(enabled) = i.enabled {
            insights.enabled = enabled;
        }
        if let Some(base_url) = i.base_url {
            insights.base_url = base_url;
        }
        if let Some(model) = i.model {
            insights.model = model;
        }
        insights.api_key = i.api_key;
    }
    // Insights fall back to the transcription key when not set separately
    if insights.api_key.is_none() {
        insights.api_key = transcription.api_key.clone();
    }

    Ok(ResolvedConfig {
        home,
        default_owner_id,
        config_file,
        transcription,
        insights,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the store directory ($KEEPSAKE_HOME/store)
pub fn store_dir() -> Result<PathBuf> {
    Ok(config()?.home.join("store"))
}
