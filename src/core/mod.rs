//! Core memory-processing logic.
//!
//! This module contains:
//! - Pipeline: creation/update orchestration over the store and gateways
//! - Query: filtered, paginated reads over the store
//! - Insights: title/summary generation
//! - Tagging: keyword-based tag detection

pub mod insights;
pub mod pipeline;
pub mod query;
pub mod tagging;

use thiserror::Error;

// Re-export commonly used types
pub use insights::{heuristic_insights, insight_generator, InsightGenerator, MemoryInsights};
pub use pipeline::{CreateMemoryOutcome, MemoryPipeline, MemoryUpdate, NewMemory};
pub use query::{MemoryDetail, MemoryListItem, MemoryPage, QueryEngine};
pub use tagging::detect_tags;

/// Errors surfaced by pipeline and query operations
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Bad input from the caller (missing audio, invalid month, unknown tag, ...)
    #[error("{0}")]
    Client(String),

    /// Unknown id, or record owned by a different owner
    #[error("Memory not found")]
    NotFound,

    /// Store failure (unexpected)
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

impl MemoryError {
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }
}
