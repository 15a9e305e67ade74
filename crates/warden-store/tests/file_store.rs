//! Integration tests for the file-backed credential store.

use warden_protocol::CredentialPair;
use warden_store::{
    ACCESS_KEY, CredentialStore, FileCredentialStore, REFRESH_KEY, StoreError,
};

fn store_in(dir: &tempfile::TempDir) -> FileCredentialStore {
    FileCredentialStore::new(dir.path().join("nested").join("credentials.json"))
}

#[tokio::test]
async fn test_load_missing_file_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    assert_eq!(store.load().await.expect("load"), None);
}

#[tokio::test]
async fn test_save_creates_parent_dirs_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    let pair = CredentialPair::new("access-1", "refresh-1");

    store.save(&pair).await.expect("save");

    assert!(store.path().exists());
    assert_eq!(store.load().await.expect("load"), Some(pair));
}

#[tokio::test]
async fn test_save_survives_a_new_store_instance() {
    // Simulates a process restart: a fresh store at the same path.
    let dir = tempfile::tempdir().expect("tempdir");
    store_in(&dir)
        .save(&CredentialPair::new("a", "r"))
        .await
        .expect("save");

    let reopened = store_in(&dir);

    assert_eq!(
        reopened.load().await.expect("load"),
        Some(CredentialPair::new("a", "r"))
    );
}

#[tokio::test]
async fn test_file_uses_fixed_entry_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store
        .save(&CredentialPair::new("a", "r"))
        .await
        .expect("save");

    let raw = std::fs::read(store.path()).expect("read");
    let json: serde_json::Value = serde_json::from_slice(&raw).expect("json");

    assert_eq!(json[ACCESS_KEY], "a");
    assert_eq!(json[REFRESH_KEY], "r");
}

#[tokio::test]
async fn test_save_replaces_previous_pair_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.save(&CredentialPair::new("a1", "r1")).await.expect("save");

    store.save(&CredentialPair::new("a2", "r1")).await.expect("save");

    assert_eq!(
        store.load().await.expect("load"),
        Some(CredentialPair::new("a2", "r1"))
    );
    assert!(!store.path().with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_clear_removes_file_and_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.save(&CredentialPair::new("a", "r")).await.expect("save");

    store.clear().await.expect("first clear");
    store.clear().await.expect("second clear is a no-op");

    assert!(!store.path().exists());
    assert_eq!(store.load().await.expect("load"), None);
}

#[tokio::test]
async fn test_lone_entry_loads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
    std::fs::write(store.path(), br#"{"access_token":"a"}"#).expect("write");

    assert_eq!(store.load().await.expect("load"), None);
    assert_eq!(
        store.entries().await.expect("entries").access_token.as_deref(),
        Some("a")
    );
}

#[tokio::test]
async fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
    std::fs::write(store.path(), b"not json").expect("write");

    let result = store.load().await;

    assert!(matches!(result, Err(StoreError::Corrupt { .. })));
}

#[cfg(unix)]
#[tokio::test]
async fn test_saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.save(&CredentialPair::new("a", "r")).await.expect("save");

    let mode = std::fs::metadata(store.path())
        .expect("metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}
