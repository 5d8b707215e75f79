use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::StoreError;
use crate::keys;
use crate::schema::{self, ManifestData, Schema};
use crate::traits::{Backend, Indexer, Record};
use crate::transaction::Batch;

/// A handle to an opened store.
///
/// Opening is idempotent: every open over the same medium observes the same
/// collections and records. Handles are cheap to clone and may be used from
/// any number of call sites; write transactions from all of them serialize
/// behind the store's transaction queue.
pub struct Store<B: Backend> {
    inner: Arc<Inner<B>>,
}

struct Inner<B> {
    backend: B,
    manifest: ManifestData,
    // Stands in for the medium's own queuing of read-write transactions:
    // held from the first read of a write operation through commit.
    write_queue: Mutex<()>,
}

impl<B: Backend> Clone for Store<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Store<B> {
    /// Opens the store over the given medium, creating whatever the schema
    /// declares and the medium is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the medium cannot be
    /// reached, or [`StoreError::SchemaUpgradeFailed`] when collection or
    /// index creation during the version transition fails.
    pub async fn open(backend: B, schema: &Schema) -> Result<Self, StoreError> {
        let manifest = schema::reconcile(&backend, schema).await?;
        debug!(
            version = manifest.version,
            collections = manifest.collections.len(),
            "store opened"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                manifest,
                write_queue: Mutex::new(()),
            }),
        })
    }

    /// Resolves the typed handle for `R`'s collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownCollection`] when the schema this store
    /// was opened with never declared the collection.
    pub fn collection<R: Record>(&self) -> Result<Collection<R, B>, StoreError> {
        let stored = self
            .inner
            .manifest
            .collections
            .get(R::COLLECTION)
            .ok_or(StoreError::UnknownCollection(R::COLLECTION))?;
        let indexes = stored
            .indexes
            .iter()
            .enumerate()
            .map(|(position, name)| (name.clone(), position as u8))
            .collect();
        Ok(Collection {
            store: self.clone(),
            indexes,
            _record: PhantomData,
        })
    }
}

/// A typed view over one collection of the store.
///
/// Every operation runs as its own transaction scoped to this collection
/// and suspends the caller until the transaction completes or fails; a
/// write's future resolves only once its whole batch is applied, so no
/// partial write is ever visible.
pub struct Collection<R: Record, B: Backend> {
    store: Store<B>,
    indexes: BTreeMap<String, u8>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, B: Backend> Clone for Collection<R, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            indexes: self.indexes.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record, B: Backend> Collection<R, B> {
    fn backend(&self) -> &B {
        &self.store.inner.backend
    }

    fn discriminator(&self, index: &'static str) -> Result<u8, StoreError> {
        self.indexes
            .get(index)
            .copied()
            .ok_or_else(|| StoreError::IndexNotFound {
                collection: R::COLLECTION,
                index: index.to_string(),
            })
    }

    fn entries_of(&self, record: &R) -> Result<Vec<(&'static str, Vec<u8>)>, StoreError> {
        let mut indexer = Indexer::new();
        record.index_entries(&mut indexer)?;
        Ok(indexer.into_entries())
    }

    /// Point lookup. A missing key is `Ok(None)`, never an error.
    pub async fn get(&self, key: &R::Key) -> Result<Option<R>, StoreError> {
        let main = keys::main_key(R::SCOPE, &keys::encode(key)?);
        match self.backend().get(&main).await? {
            Some(bytes) => Ok(Some(keys::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every record of the collection, in no particular order.
    pub async fn get_all(&self) -> Result<Vec<R>, StoreError> {
        let pairs = self
            .backend()
            .scan_prefix(&keys::main_prefix(R::SCOPE))
            .await?;
        pairs
            .iter()
            .map(|(_, value)| keys::decode(value))
            .collect()
    }

    /// Every record whose indexed field equals `value`; empty when none
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexNotFound`] when the collection has no
    /// index of that name.
    pub async fn get_all_by_index<V: Serialize + ?Sized>(
        &self,
        index: &'static str,
        value: &V,
    ) -> Result<Vec<R>, StoreError> {
        let discriminator = self.discriminator(index)?;
        let prefix = keys::index_value_prefix(R::SCOPE, discriminator, &keys::encode(value)?);
        let hits = self.backend().scan_prefix(&prefix).await?;
        let mut records = Vec::with_capacity(hits.len());
        for (_, key_bytes) in hits {
            let main = keys::main_key(R::SCOPE, &key_bytes);
            let Some(bytes) = self.backend().get(&main).await? else {
                return Err(StoreError::CorruptIndex {
                    collection: R::COLLECTION,
                });
            };
            records.push(keys::decode(&bytes)?);
        }
        Ok(records)
    }

    /// Inserts or replaces the record under its primary key. Any prior
    /// record under that key is discarded wholesale, its index entries
    /// removed and the new ones written in the same atomic batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionAborted`] when the batch fails to
    /// commit; the prior state stays intact.
    pub async fn put(&self, record: &R) -> Result<(), StoreError> {
        let key_bytes = keys::encode(&record.key())?;
        let main = keys::main_key(R::SCOPE, &key_bytes);

        let _queued = self.store.inner.write_queue.lock().await;
        let mut batch = Batch::new();
        if let Some(prior) = self.backend().get(&main).await? {
            let prior: R = keys::decode(&prior)?;
            for (name, value_bytes) in self.entries_of(&prior)? {
                let discriminator = self.discriminator(name)?;
                batch.delete(keys::index_key(
                    R::SCOPE,
                    discriminator,
                    &value_bytes,
                    &key_bytes,
                ));
            }
        }
        for (name, value_bytes) in self.entries_of(record)? {
            let discriminator = self.discriminator(name)?;
            batch.put(
                keys::index_key(R::SCOPE, discriminator, &value_bytes, &key_bytes),
                key_bytes.clone(),
            );
        }
        batch.put(main, keys::encode(record)?);

        self.backend()
            .apply(batch)
            .await
            .map_err(StoreError::TransactionAborted)?;
        debug!(collection = R::COLLECTION, "record stored");
        Ok(())
    }

    /// Removes the record under `key` along with its index entries.
    /// Succeeds as a no-op when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionAborted`] when the batch fails to
    /// commit; the prior state stays intact.
    pub async fn delete(&self, key: &R::Key) -> Result<(), StoreError> {
        let key_bytes = keys::encode(key)?;
        let main = keys::main_key(R::SCOPE, &key_bytes);

        let _queued = self.store.inner.write_queue.lock().await;
        let Some(prior) = self.backend().get(&main).await? else {
            return Ok(());
        };
        let prior: R = keys::decode(&prior)?;

        let mut batch = Batch::new();
        for (name, value_bytes) in self.entries_of(&prior)? {
            let discriminator = self.discriminator(name)?;
            batch.delete(keys::index_key(
                R::SCOPE,
                discriminator,
                &value_bytes,
                &key_bytes,
            ));
        }
        batch.delete(main);

        self.backend()
            .apply(batch)
            .await
            .map_err(StoreError::TransactionAborted)?;
        debug!(collection = R::COLLECTION, "record deleted");
        Ok(())
    }

    /// Deletes each key in turn. Every single deletion is atomic, the
    /// composite is not: the first failure propagates and deletions already
    /// applied stay applied.
    pub async fn delete_many(&self, keys: &[R::Key]) -> Result<(), StoreError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}
