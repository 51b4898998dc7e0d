//! End-to-end media lifecycle against the filesystem backend.
//!
//! Walks the full contract: add a jpeg to a collection with a `thumb`
//! conversion, assert the stored layout literally, render URLs, read the
//! content back, and cascade-delete.

use medialib::{
    AddMediaOptions, Conversion, ConversionRegistry, InMemoryRepository, MediaManager,
    MedialibConfig, StorageBackend, StorageResult, build_registry,
};
use medialib_storage::{BackendRegistry, MemoryBackend};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tempfile::TempDir;

const BASE_URL: &str = "http://localhost:8080/media";

// A one-pixel-ish stand-in for a jpeg; content is opaque to the library.
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

fn fixture(temp: &TempDir) -> (MediaManager, Arc<BackendRegistry>) {
    let toml = format!(
        r#"
        [filesystem]
        name = "local"
        root = "{}"
        base_url = "{}"
        "#,
        temp.path().display(),
        BASE_URL
    );
    let config = MedialibConfig::from_toml(&toml).unwrap();
    let backends = Arc::new(build_registry(&config).unwrap());

    let mut conversions = ConversionRegistry::new();
    conversions.register(
        "default",
        Conversion::new("thumb", |bytes| Ok(bytes[..bytes.len() / 2].to_vec())),
    );

    let manager = MediaManager::new(
        backends.clone(),
        Arc::new(conversions),
        Arc::new(InMemoryRepository::new()),
    );
    (manager, backends)
}

#[tokio::test]
async fn test_it_stores_a_file() {
    let temp = TempDir::new().unwrap();
    let (manager, backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();

    let backend = backends.get("local").unwrap();
    assert!(backend
        .has(&format!("{}/test.jpg", record.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_it_stores_a_file_and_its_conversion() {
    let temp = TempDir::new().unwrap();
    let (manager, backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();

    let backend = backends.get("local").unwrap();
    assert!(backend
        .has(&format!("{}/test.jpg", record.id))
        .await
        .unwrap());
    assert!(backend
        .has(&format!("{}/conversions/thumb.jpg", record.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_it_deletes_a_file() {
    let temp = TempDir::new().unwrap();
    let (manager, backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();
    let backend = backends.get("local").unwrap();
    assert!(backend
        .has(&format!("{}/test.jpg", record.id))
        .await
        .unwrap());

    manager.delete(&record).await.unwrap();

    assert!(!backend
        .has(&format!("{}/test.jpg", record.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_it_deletes_file_conversions() {
    let temp = TempDir::new().unwrap();
    let (manager, backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();
    let backend = backends.get("local").unwrap();
    assert!(backend
        .has(&format!("{}/conversions/thumb.jpg", record.id))
        .await
        .unwrap());

    manager.delete(&record).await.unwrap();

    assert!(!backend
        .has(&format!("{}/test.jpg", record.id))
        .await
        .unwrap());
    assert!(!backend
        .has(&format!("{}/conversions/thumb.jpg", record.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_it_retrieves_a_media_url() {
    let temp = TempDir::new().unwrap();
    let (manager, _backends) = fixture(&temp);

    let record = manager
        .add_media(
            JPEG,
            "test.jpg",
            "default",
            "local",
            &AddMediaOptions::new().preserving_original(),
        )
        .await
        .unwrap();

    assert_eq!(
        manager.get_url(&record).unwrap(),
        format!("{}/{}/test.jpg", BASE_URL, record.id)
    );

    // Content round-trips byte for byte
    let retrieved = manager.get(&record).await.unwrap();
    assert_eq!(Sha256::digest(JPEG), Sha256::digest(&retrieved));
}

#[tokio::test]
async fn test_it_retrieves_a_conversion_url() {
    let temp = TempDir::new().unwrap();
    let (manager, _backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();

    assert_eq!(
        manager.get_url_for_conversion(&record, "thumb").unwrap(),
        format!("{}/{}/conversions/thumb.jpg", BASE_URL, record.id)
    );
}

#[tokio::test]
async fn test_conversion_content_is_the_derived_bytes() {
    let temp = TempDir::new().unwrap();
    let (manager, _backends) = fixture(&temp);

    let record = manager
        .add_media(JPEG, "test.jpg", "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();

    let thumb = manager.get_conversion(&record, "thumb").await.unwrap();
    assert_eq!(thumb, &JPEG[..JPEG.len() / 2]);
}

#[tokio::test]
async fn test_add_from_file_consumes_the_source() {
    let temp = TempDir::new().unwrap();
    let (manager, _backends) = fixture(&temp);

    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("test.jpg");
    tokio::fs::write(&source, JPEG).await.unwrap();

    let record = manager
        .add_media_from_file(&source, "default", "local", &AddMediaOptions::new())
        .await
        .unwrap();

    assert_eq!(record.file_name, "test.jpg");
    assert!(!source.exists());
    assert_eq!(manager.get(&record).await.unwrap(), JPEG);
}

#[tokio::test]
async fn test_add_from_file_can_preserve_the_source() {
    let temp = TempDir::new().unwrap();
    let (manager, _backends) = fixture(&temp);

    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("test.jpg");
    tokio::fs::write(&source, JPEG).await.unwrap();

    manager
        .add_media_from_file(
            &source,
            "default",
            "local",
            &AddMediaOptions::new().preserving_original(),
        )
        .await
        .unwrap();

    assert!(source.exists());
}

/// Backend that accepts originals but refuses conversion writes, for
/// exercising the roll-back path on write failure.
struct RefusesConversionWrites {
    inner: Arc<MemoryBackend>,
}

#[async_trait::async_trait]
impl StorageBackend for RefusesConversionWrites {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn put(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        if path.contains("/conversions/") {
            return Err(medialib::StorageError::new(
                medialib::StorageErrorKind::Write(format!("{}: quota exceeded", path)),
            ));
        }
        self.inner.put(path, data).await
    }

    async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(path).await
    }

    async fn has(&self, path: &str) -> StorageResult<bool> {
        self.inner.has(path).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.inner.delete(path).await
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        self.inner.delete_prefix(prefix).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }
}

#[tokio::test]
async fn test_failed_conversion_write_rolls_back_the_original() {
    let inner = Arc::new(MemoryBackend::new("flaky", BASE_URL));
    let mut registry = BackendRegistry::new();
    registry.insert(Arc::new(RefusesConversionWrites {
        inner: inner.clone(),
    }));

    let mut conversions = ConversionRegistry::new();
    conversions.register("default", Conversion::new("thumb", |b| Ok(b.to_vec())));

    let manager = MediaManager::new(
        Arc::new(registry),
        Arc::new(conversions),
        Arc::new(InMemoryRepository::new()),
    );

    let err = manager
        .add_media(JPEG, "test.jpg", "default", "flaky", &AddMediaOptions::new())
        .await
        .unwrap_err();
    assert!(format!("{}", err).contains("quota exceeded"));

    // The original written before the failure was rolled back
    assert!(inner.is_empty().await);
}
