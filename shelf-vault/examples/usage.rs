use shelf_vault::{AuthContext, SeedUser, Vault, VaultError};
use shelfdb::MemoryBackend;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), VaultError> {
    // Open a vault over an in-memory medium and seed the user directory
    // from a startup credential list. Seeding is a no-op on later starts.
    let vault = Vault::open(MemoryBackend::new()).await?;
    vault
        .ensure_seeded([
            SeedUser {
                username: "root".to_string(),
                name: Some("Administrator".to_string()),
                password: "changeme".to_string(),
                groups: Some(vec!["Admin".to_string()]),
            },
            SeedUser::new("alice", "p1"),
        ])
        .await?;

    // Every operation carries the caller's identity explicitly.
    let root = AuthContext::new("root", ["Admin"]);
    let alice = AuthContext::new("alice", ["User"]);

    for user in vault.list_users(&root).await? {
        println!("account {} ({:?})", user.username, user.groups);
    }

    // Files are owner-scoped; listings come back newest first.
    vault
        .upload_file(&alice, "alice", "notes.txt", "text/plain", b"hello".to_vec())
        .await?;
    vault
        .upload_file(&alice, "alice", "photo.jpg", "image/jpeg", vec![0xFF; 64])
        .await?;

    for file in vault.files_for_owner(&alice, "alice").await? {
        println!("{} ({} bytes, {})", file.name, file.size, file.media_type);
    }

    let cleared = vault.remove_all_files_for_owner(&alice, "alice").await?;
    println!("cleared {cleared} files");

    Ok(())
}
