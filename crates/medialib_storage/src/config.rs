//! Backend configuration.
//!
//! This module provides TOML-based configuration for storage backends,
//! loaded through the `config` crate with optional environment overrides
//! (`MEDIALIB_` prefix, `__` separator). Credentials and public domains
//! are injected into backend constructors here; nothing reads ambient
//! global state at call time.
//!
//! # Example
//!
//! ```toml
//! [filesystem]
//! name = "local"
//! root = "/var/medialib/media"
//! base_url = "http://localhost:8080/media"
//!
//! [s3]
//! endpoint = "https://s3.us-east-1.amazonaws.com"
//! bucket = "media-bucket"
//! region = "us-east-1"
//! access_key = "AKIA..."
//! secret_key = "..."
//! domain = "https://media-bucket.s3.amazonaws.com"
//! ```

use crate::{BackendRegistry, FilesystemBackend, S3Backend};
use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use medialib_error::{ConfigError, MedialibResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct FilesystemConfig {
    /// Backend name used for registry lookup and record backend_name
    #[serde(default = "default_filesystem_name")]
    #[builder(default = "default_filesystem_name()")]
    name: String,

    /// Root directory for stored objects
    root: PathBuf,

    /// Base URL objects are publicly served under
    base_url: String,
}

/// S3-compatible backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct S3Config {
    /// Backend name used for registry lookup and record backend_name
    #[serde(default = "default_s3_name")]
    #[builder(default = "default_s3_name()")]
    name: String,

    /// Endpoint URL, e.g. `https://s3.us-east-1.amazonaws.com`
    endpoint: String,

    /// Bucket all objects are stored in
    bucket: String,

    /// Signing region
    #[serde(default = "default_region")]
    #[builder(default = "default_region()")]
    region: String,

    /// Access key id
    access_key: String,

    /// Secret access key
    secret_key: String,

    /// Public domain URLs are rendered from, e.g. a CDN in front of the bucket
    domain: String,

    /// Retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    #[builder(default = "default_max_retries()")]
    max_retries: usize,

    /// Initial retry backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    #[builder(default = "default_initial_backoff_ms()")]
    initial_backoff_ms: u64,
}

fn default_filesystem_name() -> String {
    "local".to_string()
}

fn default_s3_name() -> String {
    "s3".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

/// Process-wide medialib configuration.
///
/// Backends are optional sections; a deployment configures only the
/// backends it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, Default)]
pub struct MedialibConfig {
    /// Filesystem backend, if configured
    #[serde(default)]
    filesystem: Option<FilesystemConfig>,

    /// S3-compatible backend, if configured
    #[serde(default)]
    s3: Option<S3Config>,
}

impl MedialibConfig {
    /// Load configuration from a TOML file, applying `MEDIALIB_` prefixed
    /// environment variable overrides (`__` separates nesting levels, e.g.
    /// `MEDIALIB_S3__SECRET_KEY`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or deserialized.
    pub fn from_file(path: impl AsRef<Path>) -> MedialibResult<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("MEDIALIB").separator("__"))
            .build()
            .map_err(|e| ConfigError::new(format!("{}: {}", path.display(), e)))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("{}: {}", path.display(), e)).into())
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the string is not valid configuration.
    pub fn from_toml(toml: &str) -> MedialibResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::new(e.to_string()).into())
    }

    /// Build a config with the given backend sections, bypassing file loading.
    pub fn new(filesystem: Option<FilesystemConfig>, s3: Option<S3Config>) -> Self {
        Self { filesystem, s3 }
    }
}

/// Construct a [`BackendRegistry`] holding every backend the
/// configuration declares.
///
/// # Errors
///
/// Returns the constructor error of the first backend that fails to
/// initialize (unreachable root directory, malformed endpoint).
pub fn build_registry(config: &MedialibConfig) -> MedialibResult<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    if let Some(fs) = config.filesystem() {
        let backend = FilesystemBackend::new(fs.name().as_str(), fs.root(), fs.base_url().as_str())?;
        registry.insert(Arc::new(backend));
    }
    if let Some(s3) = config.s3() {
        registry.insert(Arc::new(S3Backend::new(s3)?));
    }

    Ok(registry)
}
