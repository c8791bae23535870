use async_trait::async_trait;
use parking_lot::Mutex;

use markread_core::storage::{entry_size, Storage, StorageMap};
use markread_core::StorageError;

/// In-process [`Storage`] holding everything in a map. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<StorageMap>,
    quota: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: StorageMap) -> Self {
        Self {
            items: Mutex::new(items),
            quota: None,
        }
    }

    /// Reject writes that would push total usage past `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StorageMap {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

fn total(items: &StorageMap) -> u64 {
    items.iter().map(|(k, v)| entry_size(k, v)).sum()
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError> {
        let items = self.items.lock();
        Ok(keys
            .iter()
            .filter_map(|k| items.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn get_all(&self) -> Result<StorageMap, StorageError> {
        Ok(self.snapshot())
    }

    async fn set(&self, new_items: StorageMap) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        if let Some(quota) = self.quota {
            let replaced: u64 = new_items
                .keys()
                .filter_map(|k| items.get(k).map(|v| entry_size(k, v)))
                .sum();
            let needed = total(&items).saturating_sub(replaced) + total(&new_items);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        items.extend(new_items);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.items.lock().clear();
        Ok(())
    }

    async fn bytes_in_use(&self, keys: Option<&[String]>) -> Result<u64, StorageError> {
        let items = self.items.lock();
        Ok(match keys {
            None => total(&items),
            Some(keys) => keys
                .iter()
                .filter_map(|k| items.get(k).map(|v| entry_size(k, v)))
                .sum(),
        })
    }
}
