//! Storage path derivation.
//!
//! Paths are pure functions of the record id and file names; no hidden
//! state, no I/O. The layout is the compatibility surface of the library:
//!
//! - original: `{id}/{file_name}`
//! - conversion: `{id}/conversions/{name}.{ext}`
//!
//! Everything belonging to one record lives under the `{id}/` prefix, so
//! cleanup can delete the prefix without enumerating conversion names
//! first. Backends without directory semantics still get per-path deletes
//! from the manager.

use std::path::Path;
use uuid::Uuid;

/// Derives deterministic, collision-resistant storage paths for a media
/// record's files.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver;

impl PathResolver {
    /// Path of the original file: `{id}/{file_name}`.
    pub fn original_path(id: &Uuid, file_name: &str) -> String {
        format!("{}/{}", id, file_name)
    }

    /// Path of a named conversion: `{id}/conversions/{name}.{ext}`.
    pub fn conversion_path(id: &Uuid, conversion_name: &str, extension: &str) -> String {
        format!("{}/conversions/{}.{}", id, conversion_name, extension)
    }

    /// Prefix all of a record's files live under.
    pub fn prefix(id: &Uuid) -> String {
        id.to_string()
    }

    /// Extension of a file name, if it has one.
    pub fn extension_of(file_name: &str) -> Option<&str> {
        Path::new(file_name).extension().and_then(|e| e.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_path_layout() {
        let id = Uuid::new_v4();
        assert_eq!(
            PathResolver::original_path(&id, "test.jpg"),
            format!("{}/test.jpg", id)
        );
    }

    #[test]
    fn conversion_path_layout() {
        let id = Uuid::new_v4();
        assert_eq!(
            PathResolver::conversion_path(&id, "thumb", "jpg"),
            format!("{}/conversions/thumb.jpg", id)
        );
    }

    #[test]
    fn paths_share_the_id_prefix() {
        let id = Uuid::new_v4();
        let prefix = PathResolver::prefix(&id);
        assert!(PathResolver::original_path(&id, "test.jpg").starts_with(&prefix));
        assert!(PathResolver::conversion_path(&id, "thumb", "jpg").starts_with(&prefix));
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(PathResolver::extension_of("test.jpg"), Some("jpg"));
        assert_eq!(PathResolver::extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(PathResolver::extension_of("README"), None);
    }
}
