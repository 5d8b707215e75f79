use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{BackendError, StoreError};
use crate::keys;
use crate::transaction::Batch;

/// A record kind stored in one collection of the store.
///
/// The associated constants describe the collection the way the schema
/// manifest persists it; [`Record::key`] extracts the primary key and
/// [`Record::index_entries`] emits the record's secondary-index values.
pub trait Record: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    /// The collection's name in the schema manifest.
    const COLLECTION: &'static str;
    /// The collection's scope byte, prefixed to every key it owns.
    const SCOPE: u8;
    /// The name of the primary-key field, recorded in the manifest.
    const PRIMARY_KEY: &'static str;
    /// Names of the collection's secondary indexes, in declaration order.
    const INDEXES: &'static [&'static str] = &[];

    type Key: Serialize + DeserializeOwned + Clone + Eq + Debug + Send + Sync;

    /// The record's primary key.
    fn key(&self) -> Self::Key;

    /// Emits one entry per secondary index this record participates in.
    fn index_entries(&self, _indexer: &mut Indexer) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Collects the serialized index values of one record.
#[derive(Debug, Default)]
pub struct Indexer {
    entries: Vec<(&'static str, Vec<u8>)>,
}

impl Indexer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds the record's value for the named index.
    pub fn add<V: Serialize + ?Sized>(
        &mut self,
        index: &'static str,
        value: &V,
    ) -> Result<(), StoreError> {
        self.entries.push((index, keys::encode(value)?));
        Ok(())
    }

    pub(crate) fn into_entries(self) -> Vec<(&'static str, Vec<u8>)> {
        self.entries
    }
}

/// A byte-oriented storage medium for the store.
///
/// Backends hold shared handles: cloning must observe the same underlying
/// data, so re-opening a store over a clone sees everything already written.
/// [`Backend::apply`] must be atomic — either every operation in the batch
/// takes effect or none do — and batches must be applied in operation order.
#[async_trait]
pub trait Backend: Clone + Send + Sync + 'static {
    /// Point lookup; `None` when the key is absent.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError>;

    /// All pairs whose key starts with `prefix`, in key order.
    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, BackendError>;

    /// Atomically applies every operation of the batch, in order.
    async fn apply(&self, batch: Batch) -> Result<(), BackendError>;
}
