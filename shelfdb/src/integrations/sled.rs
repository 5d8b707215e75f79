use std::path::Path;

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::traits::Backend;
use crate::transaction::{Batch, Op};

/// A sled-based backend.
///
/// Sled is an embedded database with atomic batch application, which is
/// exactly what [`Backend::apply`] requires. Handles clone cheaply and
/// share the same tree.
#[derive(Debug, Clone)]
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    /// Creates a temporary sled database, removed on drop. Intended for
    /// tests and scratch stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn temporary() -> Result<Self, BackendError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Opens a sled database at the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Opens a sled database with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn with_config(config: &sled::Config) -> Result<Self, BackendError> {
        let db = config.open()?;
        Ok(Self { db })
    }

    /// The underlying sled database.
    #[must_use]
    pub fn db(&self) -> &sled::Db {
        &self.db
    }
}

#[async_trait]
impl Backend for SledBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.db.get(key)?.map(|ivec| ivec.to_vec()))
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, BackendError> {
        let mut pairs = Vec::new();
        for entry in self.db.scan_prefix(prefix) {
            let (key, value) = entry?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs)
    }

    async fn apply(&self, batch: Batch) -> Result<(), BackendError> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                Op::Put { key, value } => sled_batch.insert(key, value),
                Op::Delete { key } => sled_batch.remove(key),
            }
        }
        self.db.apply_batch(sled_batch)?;
        Ok(())
    }
}
