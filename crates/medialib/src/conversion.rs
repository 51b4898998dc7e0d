//! Conversion definitions and the collection registry.
//!
//! A conversion derives a new artifact (e.g. a thumbnail) from an
//! original's bytes. The algorithm is opaque to this crate: a conversion
//! carries an arbitrary `bytes -> bytes` function supplied by the caller.
//! Conversions are grouped by collection name; adding media to a
//! collection materializes every conversion registered for it.

use medialib_error::{ConversionError, ConversionErrorKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Derivation function: original bytes in, derived bytes out, or a
/// failure reason.
pub type DeriveFn = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, String> + Send + Sync>;

/// A named conversion applied to media added to a collection.
#[derive(Clone)]
pub struct Conversion {
    name: String,
    extension: Option<String>,
    derive: DeriveFn,
}

impl Conversion {
    /// Create a conversion with the given name and derive function.
    ///
    /// The derived file keeps the original's extension unless
    /// [`with_extension`](Self::with_extension) overrides it.
    pub fn new(
        name: impl Into<String>,
        derive: impl Fn(&[u8]) -> Result<Vec<u8>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            extension: None,
            derive: Arc::new(derive),
        }
    }

    /// Override the extension of the derived file (e.g. a conversion that
    /// re-encodes to webp regardless of input format).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Conversion name; becomes the file stem under `conversions/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension override, if any.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Run the derive function.
    ///
    /// # Errors
    ///
    /// Returns a `Derivation` error carrying the function's failure reason.
    pub fn derive(&self, data: &[u8]) -> Result<Vec<u8>, ConversionError> {
        (self.derive)(data).map_err(|reason| {
            ConversionError::new(ConversionErrorKind::Derivation {
                name: self.name.clone(),
                reason,
            })
        })
    }
}

impl std::fmt::Debug for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversion")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// Registry mapping collection names to their conversions.
///
/// Conversions run in registration order. A collection with no registered
/// conversions yields an empty slice.
///
/// # Examples
///
/// ```
/// use medialib::Conversion;
/// use medialib::ConversionRegistry;
///
/// let mut registry = ConversionRegistry::new();
/// registry.register(
///     "default",
///     Conversion::new("thumb", |bytes| Ok(bytes[..bytes.len().min(64)].to_vec())),
/// );
///
/// assert_eq!(registry.conversions_for("default").len(), 1);
/// assert!(registry.conversions_for("unknown").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ConversionRegistry {
    collections: HashMap<String, Vec<Conversion>>,
}

impl ConversionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion for a collection, after any already
    /// registered for it.
    pub fn register(&mut self, collection_name: impl Into<String>, conversion: Conversion) {
        self.collections
            .entry(collection_name.into())
            .or_default()
            .push(conversion);
    }

    /// Conversions registered for a collection, in registration order.
    pub fn conversions_for(&self, collection_name: &str) -> &[Conversion] {
        self.collections
            .get(collection_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = ConversionRegistry::new();
        registry.register("default", Conversion::new("thumb", |b| Ok(b.to_vec())));
        registry.register("default", Conversion::new("preview", |b| Ok(b.to_vec())));

        let names: Vec<_> = registry
            .conversions_for("default")
            .iter()
            .map(Conversion::name)
            .collect();
        assert_eq!(names, vec!["thumb", "preview"]);
    }

    #[test]
    fn unknown_collection_is_empty() {
        let registry = ConversionRegistry::new();
        assert!(registry.conversions_for("missing").is_empty());
    }

    #[test]
    fn derivation_failure_names_the_conversion() {
        let conversion = Conversion::new("thumb", |_| Err("unsupported format".to_string()));
        let err = conversion.derive(b"bytes").unwrap_err();
        let text = format!("{}", err);
        assert!(text.contains("thumb"));
        assert!(text.contains("unsupported format"));
    }

    #[test]
    fn extension_override() {
        let conversion = Conversion::new("thumb", |b| Ok(b.to_vec())).with_extension("webp");
        assert_eq!(conversion.extension(), Some("webp"));
    }
}
