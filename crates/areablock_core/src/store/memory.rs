//! In-memory policy blob store for tests and embedding.

use super::{PolicyStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Process-local blob map.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map_or(0, |blobs| blobs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn save_all(&self, entries: &[(&str, Vec<u8>)]) -> StoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        for (key, value) in entries {
            blobs.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
