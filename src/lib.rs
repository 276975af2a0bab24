//! keepsake - voice memory capture and processing
//!
//! Records short voice memories, transcribes them, and derives structured
//! metadata (title, summary, topical tags) so moments stay browsable and
//! searchable.
//!
//! # Architecture
//!
//! Creation is a sequential pipeline with partial-failure handling:
//! - A provisional record is persisted before transcription starts, so
//!   every upload yields a durable, queryable record
//! - Transcription success derives insights and tags and finalizes the
//!   record as ready; any failure marks it failed with the captured error
//! - Reads go through a query engine with month and tag filters and
//!   deterministic pagination
//!
//! # Modules
//!
//! - `adapters`: External system integrations (transcription)
//! - `core`: Processing logic (pipeline, query, insights, tagging)
//! - `domain`: Data structures (Memory, MemoryTag, User)
//! - `store`: JSONL-backed durable storage
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Capture a memory from an audio file
//! keepsake capture memo.m4a
//!
//! # Browse February's memories tagged Language
//! keepsake list --month 2026-02 --tag Language
//!
//! # Show one memory in full
//! keepsake show <memory-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use crate::core::{MemoryError, MemoryPipeline, QueryEngine};
pub use domain::{Memory, MemoryStatus, MemoryTag};
pub use store::{MemoryFilter, MemoryStore};
