//! # Shelf Vault
//!
//! A per-user file vault and an administrative user directory over the
//! [`shelfdb`] embedded store.
//!
//! Two collections back everything: `users`, keyed by username, and
//! `files`, keyed by an opaque id with a secondary index on the owning
//! username. Every operation takes the caller's [`AuthContext`] explicitly
//! and runs as a single transaction against one collection; the documented
//! exceptions (seeding, owner-scoped sweeps) are read-then-write composites
//! whose steps are individually atomic.

mod auth;
mod errors;
mod password;
mod records;
mod seed;
mod vault;

pub use auth::{ADMIN_GROUP, AuthContext, DEFAULT_GROUP};
pub use errors::VaultError;
pub use password::{Cleartext, PasswordScheme};
pub use records::{FileRecord, SCHEMA_VERSION, UserRecord, schema};
pub use seed::SeedUser;
pub use vault::Vault;
