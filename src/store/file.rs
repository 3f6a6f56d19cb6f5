use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{PlanStore, StoreError, StoreKey};
use crate::types::CacheRecord;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One JSON document per key under `root/users/{owner}/trips/{trip}.json`.
///
/// Writes land in a sibling temporary file first and are renamed into place,
/// so readers see either the old record or the new one.
#[derive(Debug, Clone)]
pub struct FilePlanStore {
    root: PathBuf,
}

impl FilePlanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &StoreKey) -> Result<PathBuf, StoreError> {
        if !is_safe_segment(&key.owner_id) || !is_safe_segment(&key.trip_id) {
            return Err(StoreError::InvalidKey(key.clone()));
        }
        Ok(self
            .root
            .join("users")
            .join(&key.owner_id)
            .join("trips")
            .join(format!("{}.json", key.trip_id)))
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl PlanStore for FilePlanStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &StoreKey) -> Result<Option<CacheRecord>, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path, err)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.clone(),
                source,
            })
    }

    async fn set(&self, key: &StoreKey, record: &CacheRecord) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let bytes =
            serde_json::to_vec_pretty(record).map_err(|source| StoreError::Serialization {
                key: key.clone(),
                source,
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| io_error(parent, err))?;
        }

        let temp_path = path.with_extension(format!(
            "json.tmp-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(err) = fs::write(&temp_path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(&temp_path, err));
        }
        if let Err(err) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(&path, err));
        }

        debug!(target: "itinerary::store", path = %path.display(), "record written");
        Ok(())
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|err| io_error(&path, err))
    }

    async fn delete(&self, key: &StoreKey) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}
