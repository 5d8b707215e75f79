use thiserror::Error;

/// Errors reported by a storage backend.
///
/// Backends translate their medium-specific failures into this type; the
/// store then decides how each failure surfaces (open failures become
/// [`StoreError::Unavailable`], commit failures become
/// [`StoreError::TransactionAborted`]).
#[derive(Debug, Error)]
pub enum BackendError {
    /// An I/O error from the underlying medium.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the sled embedded database.
    #[cfg(feature = "sled")]
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Any other backend-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence medium could not be reached when opening the store.
    /// Fatal to all operations until resolved externally; no retry is
    /// attempted internally.
    #[error("storage medium unavailable: {0}")]
    Unavailable(#[source] BackendError),

    /// Collection or index creation failed during a version transition.
    /// Fatal for that open attempt.
    #[error("schema upgrade to version {version} failed: {reason}")]
    SchemaUpgradeFailed { version: u32, reason: String },

    /// A query named an index the collection does not have. This is a
    /// programming error and is surfaced immediately.
    #[error("collection `{collection}` has no index named `{index}`")]
    IndexNotFound {
        collection: &'static str,
        index: String,
    },

    /// The record type's collection was never declared in the store schema.
    #[error("collection `{0}` is not part of the store schema")]
    UnknownCollection(&'static str),

    /// A write transaction failed to commit. No partial write is visible.
    #[error("transaction aborted: {0}")]
    TransactionAborted(#[source] BackendError),

    /// A read against the medium failed outside of a commit.
    #[error("storage read failed: {0}")]
    Backend(#[from] BackendError),

    /// Serializing a record, key, or index value failed.
    #[error("encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Deserializing stored bytes failed, most likely store corruption.
    #[error("decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// An index entry referenced a record that no longer exists. Should
    /// never occur; indicates a bug or store corruption.
    #[error("index entry for collection `{collection}` references a missing record")]
    CorruptIndex { collection: &'static str },
}
