//! JSONL-backed memory store.
//!
//! Follows an append-only change-log layout: every mutation appends one
//! full record snapshot as a JSON line, and current state is derived by
//! replaying the log (last snapshot per id wins). Each append is a single
//! flushed write, so concurrent readers see either the pre- or post-update
//! record, never a half-written one.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::{Memory, MemoryTag, User};

/// Errors that can occur in the memory store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Memory not found: {0}")]
    NotFound(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A change-log entry (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryChange {
    timestamp: DateTime<Utc>,
    kind: ChangeKind,
    memory: Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ChangeKind {
    Created,
    Saved,
}

/// Structured filter consumed by the store's query function
#[derive(Debug, Clone)]
pub struct MemoryFilter {
    /// Only this owner's records
    pub owner_id: Uuid,

    /// Half-open `[from, to)` range over `recorded_at`
    pub recorded_range: Option<(DateTime<Utc>, DateTime<Utc>)>,

    /// Records having at least one of these tags; empty means no filtering
    pub tags: BTreeSet<MemoryTag>,
}

impl MemoryFilter {
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            recorded_range: None,
            tags: BTreeSet::new(),
        }
    }

    fn matches(&self, memory: &Memory) -> bool {
        if memory.owner_id != self.owner_id {
            return false;
        }
        if let Some((from, to)) = self.recorded_range {
            if memory.recorded_at < from || memory.recorded_at >= to {
                return false;
            }
        }
        if !self.tags.is_empty() && self.tags.is_disjoint(&memory.tags) {
            return false;
        }
        true
    }
}

/// One page of matching records plus the total match count
#[derive(Debug, Clone)]
pub struct PageSlice {
    pub items: Vec<Memory>,
    pub total_elements: u64,
}

/// JSONL-based durable memory store
pub struct MemoryStore {
    /// Path to the memories change log
    memories_path: PathBuf,

    /// Path to the owners log
    owners_path: PathBuf,
}

impl MemoryStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self {
            memories_path: dir.join("memories.jsonl"),
            owners_path: dir.join("owners.jsonl"),
        }
    }

    /// Open the store in the configured home directory
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = crate::config::store_dir().map_err(|e| {
            StoreError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))
        })?;
        fs::create_dir_all(&dir).await?;
        Ok(Self::new(dir))
    }

    /// Ensure the owner exists, creating it once (idempotent bootstrap)
    pub async fn ensure_owner(&self, owner_id: Uuid) -> Result<User, StoreError> {
        let owners = self.replay_owners().await?;
        if let Some(existing) = owners.into_iter().find(|u| u.id == owner_id) {
            return Ok(existing);
        }

        let user = User::new(owner_id, None);
        let json = serde_json::to_string(&user)?;
        self.append_line(&self.owners_path, &json).await?;
        Ok(user)
    }

    /// Persist a freshly created record
    pub async fn insert(&self, memory: &Memory) -> Result<(), StoreError> {
        self.append_change(ChangeKind::Created, memory).await
    }

    /// Persist the current state of an existing record
    pub async fn save(&self, memory: &Memory) -> Result<(), StoreError> {
        self.append_change(ChangeKind::Saved, memory).await
    }

    /// Fetch one record scoped to its owner
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Memory>, StoreError> {
        let memories = self.replay().await?;
        Ok(memories
            .get(&id)
            .filter(|m| m.owner_id == owner_id)
            .cloned())
    }

    /// Query matching records: filter, order by `created_at` descending
    /// (id as stable tiebreak), then slice out the requested page.
    pub async fn find_page(
        &self,
        filter: &MemoryFilter,
        page: usize,
        size: usize,
    ) -> Result<PageSlice, StoreError> {
        let memories = self.replay().await?;

        let mut matching: Vec<Memory> = memories
            .into_values()
            .filter(|m| filter.matches(m))
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total_elements = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();

        Ok(PageSlice {
            items,
            total_elements,
        })
    }

    /// Replay the change log to build current state
    async fn replay(&self) -> Result<HashMap<Uuid, Memory>, StoreError> {
        let mut memories = HashMap::new();

        if !self.memories_path.exists() {
            return Ok(memories);
        }

        let file = File::open(&self.memories_path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let change: MemoryChange = serde_json::from_str(&line)?;
            memories.insert(change.memory.id, change.memory);
        }

        Ok(memories)
    }

    async fn replay_owners(&self) -> Result<Vec<User>, StoreError> {
        let mut owners = Vec::new();

        if !self.owners_path.exists() {
            return Ok(owners);
        }

        let file = File::open(&self.owners_path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            owners.push(serde_json::from_str(&line)?);
        }

        Ok(owners)
    }

    async fn append_change(&self, kind: ChangeKind, memory: &Memory) -> Result<(), StoreError> {
        let change = MemoryChange {
            timestamp: Utc::now(),
            kind,
            memory: memory.clone(),
        };
        let json = serde_json::to_string(&change)?;
        self.append_line(&self.memories_path, &json).await
    }

    async fn append_line(&self, path: &PathBuf, json: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        file.write_all(format!("{}\n", json).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
