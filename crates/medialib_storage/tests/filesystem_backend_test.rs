//! Tests for the filesystem storage backend.

use medialib_storage::{FilesystemBackend, StorageBackend};
use tempfile::TempDir;

fn backend(temp: &TempDir) -> FilesystemBackend {
    FilesystemBackend::new("local", temp.path(), "http://localhost:8080/media").unwrap()
}

#[tokio::test]
async fn test_put_and_get() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    let data = b"jpeg bytes";
    backend.put("abc/test.jpg", data).await.unwrap();

    assert!(backend.has("abc/test.jpg").await.unwrap());
    let retrieved = backend.get("abc/test.jpg").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_put_replaces_existing_object() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    backend.put("abc/test.jpg", b"first").await.unwrap();
    backend.put("abc/test.jpg", b"second").await.unwrap();

    assert_eq!(backend.get("abc/test.jpg").await.unwrap(), b"second");
}

#[tokio::test]
async fn test_get_missing_object_is_not_found() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    let result = backend.get("abc/missing.jpg").await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    backend.put("abc/test.jpg", b"bytes").await.unwrap();
    backend.delete("abc/test.jpg").await.unwrap();
    assert!(!backend.has("abc/test.jpg").await.unwrap());

    // Second delete of the same path succeeds
    backend.delete("abc/test.jpg").await.unwrap();
    // So does deleting a path that never existed
    backend.delete("abc/never-existed.jpg").await.unwrap();
}

#[tokio::test]
async fn test_delete_prefix_removes_tree() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    backend.put("abc/test.jpg", b"original").await.unwrap();
    backend
        .put("abc/conversions/thumb.jpg", b"thumb")
        .await
        .unwrap();
    backend.put("def/other.jpg", b"other").await.unwrap();

    backend.delete_prefix("abc").await.unwrap();

    assert!(!backend.has("abc/test.jpg").await.unwrap());
    assert!(!backend.has("abc/conversions/thumb.jpg").await.unwrap());
    assert!(backend.has("def/other.jpg").await.unwrap());

    // Absent prefix is success
    backend.delete_prefix("abc").await.unwrap();
}

#[tokio::test]
async fn test_public_url_joins_base_and_path() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    assert_eq!(
        backend.public_url("abc/test.jpg"),
        "http://localhost:8080/media/abc/test.jpg"
    );
}

#[tokio::test]
async fn test_trailing_slash_in_base_url_is_trimmed() {
    let temp = TempDir::new().unwrap();
    let backend =
        FilesystemBackend::new("local", temp.path(), "http://localhost:8080/media/").unwrap();

    assert_eq!(
        backend.public_url("abc/test.jpg"),
        "http://localhost:8080/media/abc/test.jpg"
    );
}

#[tokio::test]
async fn test_rejects_path_traversal() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    assert!(backend.put("../escape.jpg", b"bytes").await.is_err());
    assert!(backend.put("/etc/passwd", b"bytes").await.is_err());
    assert!(backend.get("abc/../../escape.jpg").await.is_err());
}

#[tokio::test]
async fn test_no_temp_file_left_behind() {
    let temp = TempDir::new().unwrap();
    let backend = backend(&temp);

    backend.put("abc/test.jpg", b"bytes").await.unwrap();

    assert!(!temp.path().join("abc/test.tmp").exists());
    assert!(temp.path().join("abc/test.jpg").exists());
}
