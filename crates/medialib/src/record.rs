//! Media records.

use crate::PathResolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversion materialized for a record: its name plus the extension it
/// was stored with. Storing the extension keeps deletion and URL
/// rendering independent of the live conversion registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConversion {
    /// Conversion name (e.g. "thumb")
    pub name: String,
    /// Extension the derived file was stored with (e.g. "jpg")
    pub extension: String,
}

/// Durable record describing one stored asset and its conversions.
///
/// The record and its stored files are created and destroyed together:
/// while the record exists, the backend named `backend_name` holds the
/// original at `{id}/{file_name}` and each conversion at
/// `{id}/conversions/{name}.{ext}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Unique identifier; root path segment for all of the record's files
    pub id: Uuid,
    /// Collection the media was added under
    pub collection_name: String,
    /// Original file's base name
    pub file_name: String,
    /// Storage backend the record's files live on
    pub backend_name: String,
    /// Conversions materialized at creation time
    pub conversions: Vec<MediaConversion>,
    /// MIME type, if known
    pub mime_type: Option<String>,
    /// Original size in bytes
    pub size_bytes: i64,
    /// SHA-256 hash of the original content
    pub content_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MediaRecord {
    /// Storage path of the original file.
    pub fn original_path(&self) -> String {
        PathResolver::original_path(&self.id, &self.file_name)
    }

    /// Storage path of a materialized conversion, or `None` if no
    /// conversion with that name exists for this record.
    pub fn conversion_path(&self, conversion_name: &str) -> Option<String> {
        self.conversions
            .iter()
            .find(|c| c.name == conversion_name)
            .map(|c| PathResolver::conversion_path(&self.id, &c.name, &c.extension))
    }

    /// Names of the conversions materialized for this record.
    pub fn conversion_names(&self) -> impl Iterator<Item = &str> {
        self.conversions.iter().map(|c| c.name.as_str())
    }

    /// Every storage path belonging to this record: the original followed
    /// by each conversion.
    pub fn all_paths(&self) -> Vec<String> {
        let mut paths = vec![self.original_path()];
        paths.extend(
            self.conversions
                .iter()
                .map(|c| PathResolver::conversion_path(&self.id, &c.name, &c.extension)),
        );
        paths
    }
}
