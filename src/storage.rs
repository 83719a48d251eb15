use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// String-keyed JSON value store. Every write goes through one lock, and when
/// backed by a file the whole map is flushed before the write is visible.
pub struct KvStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl KvStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub async fn open(path: &Path) -> StoreResult<Self> {
        let entries = match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                error!("failed to parse store file {}: {err}", path.display());
                StoreError::from(err)
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read store file {}: {err}", path.display());
                return Err(err.into());
            }
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries: Mutex::new(entries),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().await;
        self.write_entry(&mut entries, key, value).await
    }

    /// Prepends `item` to the list at `key` unless already present, keeping at
    /// most `capacity` items. Returns whether the list changed.
    pub async fn push_unique_bounded(
        &self,
        key: &str,
        item: &str,
        capacity: usize,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let mut items: Vec<String> = match entries.get(key) {
            Some(value) => Vec::deserialize(value)?,
            None => Vec::new(),
        };

        if items.iter().any(|existing| existing == item) {
            return Ok(false);
        }

        items.insert(0, item.to_string());
        items.truncate(capacity);

        let value = serde_json::to_value(items)?;
        self.write_entry(&mut entries, key, value).await?;
        Ok(true)
    }

    async fn write_entry(
        &self,
        entries: &mut BTreeMap<String, Value>,
        key: &str,
        value: Value,
    ) -> StoreResult<()> {
        let previous = entries.insert(key.to_string(), value);

        if let Err(err) = self.persist(entries).await {
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }

        Ok(())
    }

    async fn persist(&self, entries: &BTreeMap<String, Value>) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let payload = serde_json::to_vec_pretty(entries)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}
