//! Domain types for keepsake.
//!
//! This module contains the core data structures:
//! - Memory: a transcribed voice recording plus derived metadata
//! - MemoryTag: the closed set of topical categories
//! - User: the owning user (one default owner per installation)

pub mod memory;
pub mod tag;

// Re-export commonly used types
pub use memory::{Memory, MemoryStatus, User, MAX_ERROR_LENGTH};
pub use tag::{MemoryTag, ALL_TAGS};
