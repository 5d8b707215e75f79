use shelfdb::StoreError;
use thiserror::Error;

/// Errors surfaced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The caller is not in the `Admin` group but the operation requires it.
    #[error("administrator access required")]
    AdminRequired,

    /// The caller tried to touch files owned by somebody else.
    #[error("`{actor}` may not act on files owned by `{owner}`")]
    NotPermitted { actor: String, owner: String },

    /// A storage failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}
