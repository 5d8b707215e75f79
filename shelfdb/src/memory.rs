use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::traits::Backend;
use crate::transaction::{Batch, Op};

/// A memory-based backend over a [`BTreeMap`].
///
/// Clones share the same map, so re-opening a store over a clone observes
/// everything already written — the in-memory stand-in for a durable
/// medium. Batches apply under a single lock, which makes them atomic with
/// respect to every other operation.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw entries held, manifest and index entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, BackendError> {
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn apply(&self, batch: Batch) -> Result<(), BackendError> {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        for op in batch.into_ops() {
            match op {
                Op::Put { key, value } => {
                    data.insert(key, value);
                }
                Op::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}
