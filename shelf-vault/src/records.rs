use serde::{Deserialize, Serialize};
use shelfdb::{Indexer, Record, Schema, StoreError};

/// The schema version both vault collections live under.
pub const SCHEMA_VERSION: u32 = 1;

/// The store schema: a user directory keyed by username and a file
/// collection keyed by id with an owner index.
pub fn schema() -> Schema {
    Schema::new(SCHEMA_VERSION)
        .collection::<UserRecord>()
        .collection::<FileRecord>()
}

/// One account in the user directory.
///
/// The username is the record's identity for its whole lifetime; storing a
/// record under a new username creates a second account rather than
/// renaming the first. The `password` field holds whatever representation
/// the configured [`PasswordScheme`](crate::PasswordScheme) produces —
/// cleartext under the default scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub password: String,
    pub groups: Vec<String>,
}

impl Record for UserRecord {
    const COLLECTION: &'static str = "users";
    const SCOPE: u8 = 1;
    const PRIMARY_KEY: &'static str = "username";

    type Key = String;

    fn key(&self) -> String {
        self.username.clone()
    }
}

/// One stored file. Never mutated after upload; destroyed individually or
/// in owner-scoped sweeps. The owner is a plain username reference, not a
/// foreign key — deleting the account leaves its files behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub data: Vec<u8>,
    /// Unix-millisecond upload stamp, strictly increasing per vault handle.
    pub created_at: i64,
}

impl Record for FileRecord {
    const COLLECTION: &'static str = "files";
    const SCOPE: u8 = 2;
    const PRIMARY_KEY: &'static str = "id";
    const INDEXES: &'static [&'static str] = &["owner"];

    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn index_entries(&self, indexer: &mut Indexer) -> Result<(), StoreError> {
        indexer.add("owner", &self.owner)
    }
}
