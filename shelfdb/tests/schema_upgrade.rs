//! Version transitions must only ever add what is missing: new collections,
//! or new indexes on collections that already hold records.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shelfdb::{Indexer, MemoryBackend, Record, Schema, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Account {
    login: String,
}

impl Record for Account {
    const COLLECTION: &'static str = "accounts";
    const SCOPE: u8 = 1;
    const PRIMARY_KEY: &'static str = "login";

    type Key = String;

    fn key(&self) -> String {
        self.login.clone()
    }
}

/// The documents collection as the first release shipped it: no index yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PlainDocument {
    id: String,
    author: String,
}

impl Record for PlainDocument {
    const COLLECTION: &'static str = "documents";
    const SCOPE: u8 = 2;
    const PRIMARY_KEY: &'static str = "id";

    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// The same collection one version later, now with the author index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    id: String,
    author: String,
}

impl Record for Document {
    const COLLECTION: &'static str = "documents";
    const SCOPE: u8 = 2;
    const PRIMARY_KEY: &'static str = "id";
    const INDEXES: &'static [&'static str] = &["author"];

    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn index_entries(&self, indexer: &mut Indexer) -> Result<(), StoreError> {
        indexer.add("author", &self.author)
    }
}

#[tokio::test]
async fn adding_a_collection_keeps_the_existing_one() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();

    let v1 = Store::open(backend.clone(), &Schema::new(1).collection::<Account>()).await?;
    v1.collection::<Account>()?
        .put(&Account {
            login: "alice".to_string(),
        })
        .await?;

    let v2 = Store::open(
        backend,
        &Schema::new(2)
            .collection::<Account>()
            .collection::<Document>(),
    )
    .await?;

    let accounts = v2.collection::<Account>()?.get_all().await?;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].login, "alice");

    let documents = v2.collection::<Document>()?;
    documents
        .put(&Document {
            id: "d1".to_string(),
            author: "alice".to_string(),
        })
        .await?;
    assert_eq!(documents.get_all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn adding_an_index_backfills_existing_records() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();

    // First release: documents exist, the author index does not.
    let v1 = Store::open(backend.clone(), &Schema::new(1).collection::<PlainDocument>()).await?;
    let plain = v1.collection::<PlainDocument>()?;
    plain
        .put(&PlainDocument {
            id: "d1".to_string(),
            author: "alice".to_string(),
        })
        .await?;
    plain
        .put(&PlainDocument {
            id: "d2".to_string(),
            author: "bob".to_string(),
        })
        .await?;

    // Second release declares the index; the upgrade must build it from the
    // records already present.
    let v2 = Store::open(backend, &Schema::new(2).collection::<Document>()).await?;
    let documents = v2.collection::<Document>()?;

    let for_alice = documents.get_all_by_index("author", "alice").await?;
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].id, "d1");

    let for_bob = documents.get_all_by_index("author", "bob").await?;
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].id, "d2");
    Ok(())
}

#[tokio::test]
async fn reopening_at_the_same_version_changes_nothing() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();
    let schema = Schema::new(1).collection::<Document>();

    let first = Store::open(backend.clone(), &schema).await?;
    first
        .collection::<Document>()?
        .put(&Document {
            id: "d1".to_string(),
            author: "alice".to_string(),
        })
        .await?;
    let raw_entries = backend.len();

    let reopened = Store::open(backend.clone(), &schema).await?;
    assert_eq!(backend.len(), raw_entries);
    assert_eq!(reopened.collection::<Document>()?.get_all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn version_downgrade_is_rejected() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();

    Store::open(backend.clone(), &Schema::new(2).collection::<Account>()).await?;

    let err = Store::open(backend, &Schema::new(1).collection::<Account>())
        .await
        .err()
        .context("expected error")?;
    assert!(matches!(
        err,
        StoreError::SchemaUpgradeFailed { version: 1, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn conflicting_scope_declarations_are_rejected() -> anyhow::Result<()> {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Clashing {
        login: String,
    }

    impl Record for Clashing {
        const COLLECTION: &'static str = "clashing";
        const SCOPE: u8 = 1; // same scope as Account
        const PRIMARY_KEY: &'static str = "login";

        type Key = String;

        fn key(&self) -> String {
            self.login.clone()
        }
    }

    let err = Store::open(
        MemoryBackend::new(),
        &Schema::new(1).collection::<Account>().collection::<Clashing>(),
    )
    .await
    .err()
    .context("expected error")?;
    assert!(matches!(err, StoreError::SchemaUpgradeFailed { .. }));
    Ok(())
}
