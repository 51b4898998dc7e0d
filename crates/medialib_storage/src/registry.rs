//! Backend registry.
//!
//! Maps backend names to live [`StorageBackend`] instances. Backend
//! selection is configuration-driven polymorphism over the backend
//! capability set, resolved by name at call time.

use crate::StorageBackend;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named storage backends.
///
/// # Examples
///
/// ```
/// use medialib_storage::{BackendRegistry, MemoryBackend};
/// use std::sync::Arc;
///
/// let mut registry = BackendRegistry::new();
/// registry.insert(Arc::new(MemoryBackend::new("memory", "https://media.example.com")));
///
/// assert!(registry.get("memory").is_some());
/// assert!(registry.get("s3").is_none());
/// ```
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own name, replacing any previous
    /// backend with the same name.
    pub fn insert(&mut self, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(name).cloned()
    }

    /// Names of all registered backends, in arbitrary order.
    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the registry holds no backends.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .finish()
    }
}
