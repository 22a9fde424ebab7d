//! Storage types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub type FileId = u64;

/// A managed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: FileId,
    /// Stream URI, e.g. `public://webform/contact/Invoice_123.pdf`
    pub uri: String,
    pub filename: String,
    pub size: u64,
    pub permanent: bool,
    pub created: DateTime<Utc>,
}

/// Binary resource storage
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Look up a file by id
    async fn load(&self, id: FileId) -> Result<Option<StoredFile>>;

    /// Read the contents behind a URI
    async fn read(&self, uri: &str) -> Result<Vec<u8>>;

    /// Write `data` to `destination`, replacing any file already there.
    /// The saved file is permanent.
    async fn save_data(&self, data: &[u8], destination: &str) -> Result<StoredFile>;

    /// Remove the file and its contents
    async fn delete(&self, id: FileId) -> Result<()>;

    /// Externally reachable URL for a URI, if the URI is public
    fn external_url(&self, uri: &str) -> Option<String>;
}

/// Split `scheme://target` into its parts
pub fn split_uri(uri: &str) -> Option<(&str, &str)> {
    let (scheme, target) = uri.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    Some((scheme, target))
}

/// Last path segment of a URI
pub fn basename(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// `(stem, extension)` of a URI's basename; extension is empty when absent
pub fn path_info(uri: &str) -> (&str, &str) {
    let name = basename(uri);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

/// File id stored in a record value. Ids are numbers or numeric strings;
/// multi-value elements use the first entry.
pub fn parse_file_id(value: &Value) -> Option<FileId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.first().and_then(parse_file_id),
        _ => None,
    }
}
