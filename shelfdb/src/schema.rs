//! Schema declaration and the persisted manifest.
//!
//! The manifest lives under the reserved empty key and records, per
//! collection, its scope byte, primary-key field, and index list. Opening a
//! store reconciles the declared [`Schema`] against the manifest by adding
//! whatever is missing — whole collections, or single indexes on existing
//! collections — and never drops or resets persisted state. Re-opening at an
//! unchanged version performs no writes at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::keys;
use crate::traits::{Backend, Indexer, Record};
use crate::transaction::Batch;

/// Decodes a stored record and returns its encoded primary key plus its
/// index entries. Lets the untyped upgrade path backfill indexes over
/// records whose concrete type only the schema declaration knows.
type IndexSourceFn = fn(&[u8]) -> Result<(Vec<u8>, Vec<(&'static str, Vec<u8>)>), StoreError>;

/// The declaration of one collection, derived from its [`Record`] type.
#[derive(Debug, Clone)]
pub struct CollectionDef {
    pub name: &'static str,
    pub scope: u8,
    pub primary_key: &'static str,
    pub indexes: &'static [&'static str],
    index_source: IndexSourceFn,
}

impl CollectionDef {
    pub fn of<R: Record>() -> Self {
        Self {
            name: R::COLLECTION,
            scope: R::SCOPE,
            primary_key: R::PRIMARY_KEY,
            indexes: R::INDEXES,
            index_source: index_source::<R>,
        }
    }
}

fn index_source<R: Record>(
    bytes: &[u8],
) -> Result<(Vec<u8>, Vec<(&'static str, Vec<u8>)>), StoreError> {
    let record: R = keys::decode(bytes)?;
    let key_bytes = keys::encode(&record.key())?;
    let mut indexer = Indexer::new();
    record.index_entries(&mut indexer)?;
    Ok((key_bytes, indexer.into_entries()))
}

/// The schema a store is opened against: a version number and the
/// collections that must exist at that version.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: u32,
    pub collections: Vec<CollectionDef>,
}

impl Schema {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            collections: Vec::new(),
        }
    }

    /// Declares one collection, in the order scopes were assigned.
    #[must_use]
    pub fn collection<R: Record>(mut self) -> Self {
        self.collections.push(CollectionDef::of::<R>());
        self
    }
}

/// The manifest as persisted in the medium.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ManifestData {
    pub version: u32,
    pub collections: BTreeMap<String, StoredCollection>,
}

/// One collection as the manifest recorded it. The index list is
/// append-only: an index's position is its key discriminator, so existing
/// entries stay addressable across upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredCollection {
    pub scope: u8,
    pub primary_key: String,
    pub indexes: Vec<String>,
}

fn upgrade_failed(version: u32, reason: impl Into<String>) -> StoreError {
    StoreError::SchemaUpgradeFailed {
        version,
        reason: reason.into(),
    }
}

/// Brings the persisted manifest up to the declared schema, creating
/// missing collections and indexes and backfilling added indexes from the
/// records already present. Existing data is never dropped.
pub(crate) async fn reconcile<B: Backend>(
    backend: &B,
    schema: &Schema,
) -> Result<ManifestData, StoreError> {
    let version = schema.version;

    let raw = backend
        .get(&keys::manifest_key())
        .await
        .map_err(StoreError::Unavailable)?;
    let mut manifest = match raw {
        Some(bytes) => keys::decode::<ManifestData>(&bytes)
            .map_err(|e| upgrade_failed(version, format!("manifest unreadable: {e}")))?,
        None => ManifestData::default(),
    };

    if manifest.version > version {
        return Err(upgrade_failed(
            version,
            format!("store already at newer version {}", manifest.version),
        ));
    }

    for (i, def) in schema.collections.iter().enumerate() {
        for other in &schema.collections[i + 1..] {
            if def.scope == other.scope {
                return Err(upgrade_failed(
                    version,
                    format!(
                        "collections `{}` and `{}` declare the same scope {}",
                        def.name, other.name, def.scope
                    ),
                ));
            }
        }
    }

    let mut dirty = manifest.version != version;
    for def in &schema.collections {
        if !manifest.collections.contains_key(def.name) {
            manifest.collections.insert(
                def.name.to_string(),
                StoredCollection {
                    scope: def.scope,
                    primary_key: def.primary_key.to_string(),
                    indexes: def.indexes.iter().map(|s| (*s).to_string()).collect(),
                },
            );
            info!(collection = def.name, "created collection");
            dirty = true;
            continue;
        }
        let Some(stored) = manifest.collections.get_mut(def.name) else {
            continue;
        };
        if stored.scope != def.scope {
            return Err(upgrade_failed(
                version,
                format!(
                    "collection `{}` persisted with scope {}, declared with {}",
                    def.name, stored.scope, def.scope
                ),
            ));
        }
        if stored.primary_key != def.primary_key {
            return Err(upgrade_failed(
                version,
                format!(
                    "collection `{}` persisted with primary key `{}`, declared with `{}`",
                    def.name, stored.primary_key, def.primary_key
                ),
            ));
        }
        for &index in def.indexes {
            if stored.indexes.iter().any(|existing| existing == index) {
                continue;
            }
            // The discriminator is fixed before the name is registered, so a
            // crash between backfill and manifest save just rewrites the same
            // entries on the next open.
            let discriminator = stored.indexes.len() as u8;
            backfill_index(backend, def, discriminator, index)
                .await
                .map_err(|e| upgrade_failed(version, e.to_string()))?;
            stored.indexes.push(index.to_string());
            info!(collection = def.name, index, "added index");
            dirty = true;
        }
    }

    if dirty {
        manifest.version = version;
        let bytes =
            keys::encode(&manifest).map_err(|e| upgrade_failed(version, e.to_string()))?;
        let mut batch = Batch::new();
        batch.put(keys::manifest_key(), bytes);
        backend
            .apply(batch)
            .await
            .map_err(|e| upgrade_failed(version, e.to_string()))?;
        debug!(version, "schema manifest saved");
    }

    Ok(manifest)
}

/// Writes index entries for every record already in the collection.
async fn backfill_index<B: Backend>(
    backend: &B,
    def: &CollectionDef,
    discriminator: u8,
    index: &'static str,
) -> Result<(), StoreError> {
    let records = backend.scan_prefix(&keys::main_prefix(def.scope)).await?;
    let mut batch = Batch::new();
    for (_, value) in &records {
        let (key_bytes, entries) = (def.index_source)(value)?;
        for (name, value_bytes) in entries {
            if name == index {
                batch.put(
                    keys::index_key(def.scope, discriminator, &value_bytes, &key_bytes),
                    key_bytes.clone(),
                );
            }
        }
    }
    if batch.is_empty() {
        return Ok(());
    }
    info!(
        collection = def.name,
        index,
        entries = batch.len(),
        "backfilling index"
    );
    backend.apply(batch).await?;
    Ok(())
}
