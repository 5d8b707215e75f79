//! # ShelfDB
//!
//! An embedded, single-process transactional collection store with
//! secondary indexes and pluggable storage backends.
//!
//! ## Features
//!
//! - Generic storage backend support with atomic batch commits
//! - Typed collections with exact-key and secondary-index lookups
//! - Versioned, idempotent schema creation and add-only upgrades
//! - Fully asynchronous operations, one transaction each

mod errors;
mod keys;
mod memory;
mod schema;
mod store;
mod traits;
mod transaction;

#[cfg(feature = "sled")]
mod integrations;

pub use errors::{BackendError, StoreError};
pub use memory::MemoryBackend;
pub use schema::{CollectionDef, Schema};
pub use store::{Collection, Store};
pub use traits::{Backend, Indexer, Record};
pub use transaction::{Batch, Op};

#[cfg(feature = "sled")]
pub use integrations::sled::SledBackend;
