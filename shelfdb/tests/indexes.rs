use anyhow::Context;
use serde::{Deserialize, Serialize};
use shelfdb::{Indexer, MemoryBackend, Record, Schema, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    id: String,
    author: String,
    body: Vec<u8>,
}

impl Record for Document {
    const COLLECTION: &'static str = "documents";
    const SCOPE: u8 = 1;
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

fn schema() -> Schema {
    Schema::new(1).collection::<Document>()
}

fn doc(id: &str, author: &str) -> Document {
    Document {
        id: id.to_string(),
        author: author.to_string(),
        body: vec![0xAB; 4],
    }
}

async fn ids_by_author(
    documents: &shelfdb::Collection<Document, MemoryBackend>,
    author: &str,
) -> anyhow::Result<Vec<String>> {
    let mut ids: Vec<String> = documents
        .get_all_by_index("author", author)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    ids.sort();
    Ok(ids)
}

#[tokio::test]
async fn index_lookup_returns_exactly_the_matching_set() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    documents.put(&doc("d1", "alice")).await?;
    documents.put(&doc("d2", "alice")).await?;
    documents.put(&doc("d3", "bob")).await?;

    assert_eq!(ids_by_author(&documents, "alice").await?, vec!["d1", "d2"]);
    assert_eq!(ids_by_author(&documents, "bob").await?, vec!["d3"]);
    assert!(ids_by_author(&documents, "carol").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn replacing_a_record_moves_its_index_entry() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    documents.put(&doc("d1", "alice")).await?;
    documents.put(&doc("d1", "bob")).await?;

    assert!(ids_by_author(&documents, "alice").await?.is_empty());
    assert_eq!(ids_by_author(&documents, "bob").await?, vec!["d1"]);
    Ok(())
}

#[tokio::test]
async fn deleting_a_record_removes_its_index_entry() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    documents.put(&doc("d1", "alice")).await?;
    documents.put(&doc("d2", "alice")).await?;
    documents.delete(&"d1".to_string()).await?;

    assert_eq!(ids_by_author(&documents, "alice").await?, vec!["d2"]);
    Ok(())
}

#[tokio::test]
async fn delete_many_clears_index_entries_for_each_key() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    documents.put(&doc("d1", "alice")).await?;
    documents.put(&doc("d2", "alice")).await?;
    documents.put(&doc("d3", "bob")).await?;

    documents
        .delete_many(&["d1".to_string(), "d2".to_string()])
        .await?;

    assert!(ids_by_author(&documents, "alice").await?.is_empty());
    assert_eq!(ids_by_author(&documents, "bob").await?, vec!["d3"]);
    Ok(())
}

#[tokio::test]
async fn unknown_index_name_is_surfaced() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    let err = documents
        .get_all_by_index("editor", "alice")
        .await
        .err()
        .context("expected error")?;
    assert!(matches!(
        err,
        StoreError::IndexNotFound {
            collection: "documents",
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn author_values_with_shared_prefixes_stay_separate() -> anyhow::Result<()> {
    let store = Store::open(MemoryBackend::new(), &schema()).await?;
    let documents = store.collection::<Document>()?;

    documents.put(&doc("d1", "al")).await?;
    documents.put(&doc("d2", "alice")).await?;
    documents.put(&doc("d3", "alice")).await?;

    assert_eq!(ids_by_author(&documents, "al").await?, vec!["d1"]);
    assert_eq!(ids_by_author(&documents, "alice").await?, vec!["d2", "d3"]);
    Ok(())
}
