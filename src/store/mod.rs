//! Persistence surface for generated itineraries.
//!
//! Stores hold whole [`CacheRecord`] documents and carry no planning logic.

pub mod file;
pub mod memory;

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::types::CacheRecord;

pub use file::FilePlanStore;
pub use memory::MemoryPlanStore;

/// Document key: one record per (owner, trip).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub owner_id: String,
    pub trip_id: String,
}

impl StoreKey {
    pub fn new(owner_id: impl Into<String>, trip_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            trip_id: trip_id.into(),
        }
    }

    /// `users/{ownerId}/trips/{tripId}`
    pub fn document_path(&self) -> String {
        format!("users/{}/trips/{}", self.owner_id, self.trip_id)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document_path())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored document `{key}` is not a valid record: {source}")]
    Corrupt {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize record `{key}`: {source}")]
    Serialization {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid document key `{0}`")]
    InvalidKey(StoreKey),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A document store keyed by (owner, trip).
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &StoreKey) -> Result<Option<CacheRecord>, StoreError>;

    /// Replace whatever is stored under `key`. Never merges.
    async fn set(&self, key: &StoreKey, record: &CacheRecord) -> Result<(), StoreError>;

    async fn exists(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns whether a record was removed.
    async fn delete(&self, key: &StoreKey) -> Result<bool, StoreError>;
}
