use std::sync::{Arc, Mutex, PoisonError};

use shelfdb::{Backend, Collection, Store};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthContext, DEFAULT_GROUP};
use crate::errors::VaultError;
use crate::password::{Cleartext, PasswordScheme};
use crate::records::{self, FileRecord, UserRecord};
use crate::seed::SeedUser;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// The vault: a per-user file collection and an administrative user
/// directory over one opened store.
///
/// Every operation takes the caller's [`AuthContext`] explicitly. User
/// directory operations require the `Admin` group; file operations are
/// scoped to the authenticated owner (admins may act for anyone). Handles
/// clone cheaply and share the underlying store.
#[derive(Clone)]
pub struct Vault<B: Backend> {
    users: Collection<UserRecord, B>,
    files: Collection<FileRecord, B>,
    scheme: Arc<dyn PasswordScheme>,
    last_stamp: Arc<Mutex<i64>>,
}

impl<B: Backend> Vault<B> {
    /// Opens the vault over the given medium, creating the schema when it
    /// is absent or incomplete. Idempotent across repeated opens.
    ///
    /// # Errors
    ///
    /// Returns [`shelfdb::StoreError::Unavailable`] when the medium cannot
    /// be reached and [`shelfdb::StoreError::SchemaUpgradeFailed`] when
    /// collection or index creation fails.
    pub async fn open(backend: B) -> Result<Self, VaultError> {
        let store = Store::open(backend, &records::schema()).await?;
        Self::with_store(&store)
    }

    /// Builds a vault over an already-opened store handle.
    pub fn with_store(store: &Store<B>) -> Result<Self, VaultError> {
        Ok(Self {
            users: store.collection()?,
            files: store.collection()?,
            scheme: Arc::new(Cleartext),
            last_stamp: Arc::new(Mutex::new(0)),
        })
    }

    /// Replaces the password scheme used for seeding and verification.
    #[must_use]
    pub fn with_password_scheme(mut self, scheme: impl PasswordScheme + 'static) -> Self {
        self.scheme = Arc::new(scheme);
        self
    }

    /// Populates the user directory from the startup credential list.
    ///
    /// Acts only when the directory is observed empty immediately
    /// beforehand, so calling this on every startup is safe. The emptiness
    /// check and the inserts are separate transactions: each inserted
    /// account is atomic, the seeding pass as a whole is not.
    ///
    /// Returns the number of accounts inserted.
    pub async fn ensure_seeded(
        &self,
        seeds: impl IntoIterator<Item = SeedUser>,
    ) -> Result<usize, VaultError> {
        if !self.users.get_all().await?.is_empty() {
            debug!("user directory already populated, skipping seed");
            return Ok(0);
        }
        let mut inserted = 0;
        for seed in seeds {
            let record = seed.into_record(self.scheme.as_ref());
            self.users.put(&record).await?;
            inserted += 1;
        }
        if inserted > 0 {
            info!(accounts = inserted, "seeded user directory");
        }
        Ok(inserted)
    }

    // ── User directory ──────────────────────────────────────────────────

    /// Every account in the directory. Admin only.
    pub async fn list_users(&self, auth: &AuthContext) -> Result<Vec<UserRecord>, VaultError> {
        require_admin(auth)?;
        Ok(self.users.get_all().await?)
    }

    /// One account by username. Admin only; absent is `None`.
    pub async fn user(
        &self,
        auth: &AuthContext,
        username: &str,
    ) -> Result<Option<UserRecord>, VaultError> {
        require_admin(auth)?;
        Ok(self.users.get(&username.to_string()).await?)
    }

    /// Creates or fully replaces the account stored under the record's
    /// username; nothing of the prior record survives. Admin only.
    ///
    /// Boundary defaults are applied here: an empty display name falls back
    /// to the username and an empty group list to `["User"]`. Storing a
    /// record under a new username is not a rename — it creates a second
    /// account and leaves the old one in place.
    pub async fn upsert_user(
        &self,
        auth: &AuthContext,
        mut record: UserRecord,
    ) -> Result<(), VaultError> {
        require_admin(auth)?;
        if record.name.is_empty() {
            record.name = record.username.clone();
        }
        if record.groups.is_empty() {
            record.groups = vec![DEFAULT_GROUP.to_string()];
        }
        self.users.put(&record).await?;
        debug!(username = %record.username, "user record stored");
        Ok(())
    }

    /// Deletes the account. Admin only; deleting an absent username
    /// succeeds. The account's files are left behind (the owner field is
    /// not a foreign key); use [`Vault::remove_all_files_for_owner`] for
    /// the two-step cleanup.
    pub async fn remove_user(&self, auth: &AuthContext, username: &str) -> Result<(), VaultError> {
        require_admin(auth)?;
        self.users.delete(&username.to_string()).await?;
        info!(username, "user account deleted");
        Ok(())
    }

    /// Checks a login candidate through the configured password scheme.
    /// Unknown usernames never verify.
    pub async fn verify_credentials(
        &self,
        username: &str,
        candidate: &str,
    ) -> Result<bool, VaultError> {
        let user = self.users.get(&username.to_string()).await?;
        Ok(user.is_some_and(|user| self.scheme.verify(&user.password, candidate)))
    }

    // ── File vault ──────────────────────────────────────────────────────

    /// The files `owner` has stored, newest first.
    pub async fn files_for_owner(
        &self,
        auth: &AuthContext,
        owner: &str,
    ) -> Result<Vec<FileRecord>, VaultError> {
        require_owner(auth, owner)?;
        let mut files = self.files.get_all_by_index("owner", owner).await?;
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    /// Stores a new file for `owner` and returns its generated id. An empty
    /// media type falls back to `application/octet-stream`; the size is the
    /// payload's byte count.
    pub async fn upload_file(
        &self,
        auth: &AuthContext,
        owner: &str,
        name: &str,
        media_type: &str,
        data: Vec<u8>,
    ) -> Result<String, VaultError> {
        require_owner(auth, owner)?;
        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            media_type: if media_type.is_empty() {
                FALLBACK_MEDIA_TYPE.to_string()
            } else {
                media_type.to_string()
            },
            size: data.len() as u64,
            data,
            created_at: self.next_stamp(),
        };
        self.files.put(&record).await?;
        debug!(owner, file = name, size = record.size, "file stored");
        Ok(record.id)
    }

    /// One file by id, visible to its owner (or an admin). Absent is `None`.
    pub async fn file(
        &self,
        auth: &AuthContext,
        id: &str,
    ) -> Result<Option<FileRecord>, VaultError> {
        let Some(record) = self.files.get(&id.to_string()).await? else {
            return Ok(None);
        };
        require_owner(auth, &record.owner)?;
        Ok(Some(record))
    }

    /// Deletes one file by id. An unknown id succeeds as a no-op; an
    /// existing file may only be deleted by its owner (or an admin).
    pub async fn remove_file(&self, auth: &AuthContext, id: &str) -> Result<(), VaultError> {
        let Some(record) = self.files.get(&id.to_string()).await? else {
            return Ok(());
        };
        require_owner(auth, &record.owner)?;
        self.files.delete(&record.id).await?;
        debug!(owner = %record.owner, file = %record.name, "file deleted");
        Ok(())
    }

    /// Removes every file `owner` has stored and returns how many were
    /// deleted.
    ///
    /// This is a read-then-write composite, not one transaction: each
    /// deletion is atomic, the sweep as a whole is not, and a file uploaded
    /// between the read and the deletes survives it.
    pub async fn remove_all_files_for_owner(
        &self,
        auth: &AuthContext,
        owner: &str,
    ) -> Result<usize, VaultError> {
        require_owner(auth, owner)?;
        let files = self.files.get_all_by_index("owner", owner).await?;
        let ids: Vec<String> = files.into_iter().map(|file| file.id).collect();
        self.files.delete_many(&ids).await?;
        if !ids.is_empty() {
            info!(owner, files = ids.len(), "cleared owner's files");
        }
        Ok(ids.len())
    }

    /// A strictly increasing unix-millisecond stamp, so files uploaded
    /// within the same millisecond still sort deterministically.
    fn next_stamp(&self) -> i64 {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        let mut last = self
            .last_stamp
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = now.max(*last + 1);
        *last
    }
}

fn require_admin(auth: &AuthContext) -> Result<(), VaultError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(VaultError::AdminRequired)
    }
}

fn require_owner(auth: &AuthContext, owner: &str) -> Result<(), VaultError> {
    if auth.may_act_for(owner) {
        Ok(())
    } else {
        Err(VaultError::NotPermitted {
            actor: auth.username.clone(),
            owner: owner.to_string(),
        })
    }
}
