use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PlanStore, StoreError, StoreKey};
use crate::types::CacheRecord;

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    records: RwLock<HashMap<StoreKey, CacheRecord>>,
    writes: AtomicUsize,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &StoreKey) -> Result<Option<CacheRecord>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn set(&self, key: &StoreKey, record: &CacheRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(key.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn delete(&self, key: &StoreKey) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(key).is_some())
    }
}
