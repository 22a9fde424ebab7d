//! Local filesystem file store
//!
//! Maps `public://` and `private://` URIs onto directories below a root
//! path. Only `public://` files get an external URL.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::types::{basename, split_uri, FileId, FileStore, StoredFile};
use crate::error::{FillPdfError, Result};

pub struct LocalFileStore {
    /// Directory backing `public://`
    public_root: PathBuf,
    /// Directory backing `private://`
    private_root: PathBuf,
    /// Base URL the public directory is served under
    base_url: String,
    files: RwLock<HashMap<FileId, StoredFile>>,
    next_id: AtomicU64,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        let root = root.into();
        Self {
            public_root: root.join("public"),
            private_root: root.join("private"),
            base_url: base_url.trim_end_matches('/').to_string(),
            files: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Resolve a URI to a path on disk
    pub fn real_path(&self, uri: &str) -> Result<PathBuf> {
        let (scheme, target) = split_uri(uri)
            .ok_or_else(|| FillPdfError::Storage(format!("Invalid URI: {}", uri)))?;

        let root = match scheme {
            "public" => &self.public_root,
            "private" => &self.private_root,
            _ => {
                return Err(FillPdfError::Storage(format!(
                    "Unsupported scheme: {}",
                    scheme
                )))
            }
        };

        let relative = Path::new(target);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(FillPdfError::Storage(format!(
                "Refusing path outside the store: {}",
                uri
            )));
        }

        Ok(root.join(relative))
    }

    /// Track a file that already exists on disk
    pub async fn register(&self, uri: &str) -> Result<StoredFile> {
        let path = self.real_path(uri)?;
        let metadata = tokio::fs::metadata(&path).await?;

        let file = StoredFile {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            uri: uri.to_string(),
            filename: basename(uri).to_string(),
            size: metadata.len(),
            permanent: true,
            created: Utc::now(),
        };

        self.files.write().await.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_by_uri(&self, uri: &str) -> Option<FileId> {
        self.files
            .read()
            .await
            .values()
            .find(|f| f.uri == uri)
            .map(|f| f.id)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn load(&self, id: FileId) -> Result<Option<StoredFile>> {
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.real_path(uri)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FillPdfError::NotFound(uri.to_string())
            } else {
                FillPdfError::Io(e)
            }
        })
    }

    async fn save_data(&self, data: &[u8], destination: &str) -> Result<StoredFile> {
        let path = self.real_path(destination)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        // Replacing keeps the existing file id
        let id = match self.find_by_uri(destination).await {
            Some(id) => id,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let file = StoredFile {
            id,
            uri: destination.to_string(),
            filename: basename(destination).to_string(),
            size: data.len() as u64,
            permanent: true,
            created: Utc::now(),
        };

        self.files.write().await.insert(id, file.clone());

        tracing::debug!(file_id = id, uri = %destination, size = data.len(), "Saved file");

        Ok(file)
    }

    async fn delete(&self, id: FileId) -> Result<()> {
        let file = self
            .files
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| FillPdfError::NotFound(format!("file {}", id)))?;

        let path = self.real_path(&file.uri)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            // The record is gone either way; a missing file is fine
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(FillPdfError::Io(e)),
        }

        tracing::info!(file_id = id, uri = %file.uri, "Deleted file");
        Ok(())
    }

    fn external_url(&self, uri: &str) -> Option<String> {
        let (scheme, target) = split_uri(uri)?;
        if scheme != "public" {
            return None;
        }

        let encoded: Vec<String> = target
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        Some(format!("{}/{}", self.base_url, encoded.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalFileStore {
        LocalFileStore::new(dir.path(), "https://example.com/files/")
    }

    #[test]
    fn test_external_url() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(
            store.external_url("public://forms/tax form.pdf").as_deref(),
            Some("https://example.com/files/forms/tax%20form.pdf")
        );
        assert_eq!(store.external_url("private://forms/a.pdf"), None);
        assert_eq!(store.external_url("not-a-uri"), None);
    }

    #[test]
    fn test_real_path_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.real_path("public://../etc/passwd").is_err());
        assert!(store.real_path("s3://bucket/a.pdf").is_err());
        assert!(store.real_path("public://a/b.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_save_replace_keeps_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = store
            .save_data(b"one", "public://webform/contact/out.pdf")
            .await
            .unwrap();
        let second = store
            .save_data(b"two", "public://webform/contact/out.pdf")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.permanent);
        assert_eq!(
            store.read("public://webform/contact/out.pdf").await.unwrap(),
            b"two"
        );
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let file = store.save_data(b"img", "public://up/sig.png").await.unwrap();
        store.delete(file.id).await.unwrap();

        assert!(store.load(file.id).await.unwrap().is_none());
        assert!(matches!(
            store.read("public://up/sig.png").await,
            Err(FillPdfError::NotFound(_))
        ));
        assert!(store.delete(file.id).await.is_err());
    }

    #[tokio::test]
    async fn test_register_existing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        std::fs::create_dir_all(dir.path().join("public/forms")).unwrap();
        std::fs::write(dir.path().join("public/forms/w9.pdf"), b"%PDF-1.4").unwrap();

        let file = store.register("public://forms/w9.pdf").await.unwrap();
        assert_eq!(file.size, 8);
        assert_eq!(file.filename, "w9.pdf");
        assert_eq!(store.load(file.id).await.unwrap(), Some(file));
    }
}
