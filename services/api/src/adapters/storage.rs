//! services/api/src/adapters/storage.rs
//!
//! This module contains the object-storage adapter, the concrete
//! implementation of the `ObjectStorageService` port. Objects live as
//! plain files under a configured root directory; store keys map onto
//! relative paths beneath it.

use async_trait::async_trait;
use shelf_core::ports::{ObjectStorageService, PortError, PortResult};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// A storage adapter backed by the local filesystem.
#[derive(Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Creates a new `FsStorage` rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Maps a store key onto a path under the root. Keys must be
    /// relative and free of parent components so they cannot escape it.
    fn resolve(&self, path: &str) -> PortResult<PathBuf> {
        if path.is_empty() {
            return Err(PortError::Unexpected("Empty storage path".to_string()));
        }
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(PortError::Unexpected(format!(
                "Invalid storage path '{}'",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorageService for FsStorage {
    async fn put_object(&self, path: &str, bytes: &[u8]) -> PortResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        fs::write(&full, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_object(&self, path: &str) -> PortResult<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PortError::NotFound(format!("Object '{}' not found", path))
            }
            _ => PortError::Unexpected(e.to_string()),
        })
    }

    async fn delete_object(&self, path: &str) -> PortResult<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PortError::NotFound(format!("Object '{}' not found", path))
            }
            _ => PortError::Unexpected(e.to_string()),
        })
    }

    async fn object_exists(&self, path: &str) -> PortResult<bool> {
        let full = self.resolve(path)?;
        fs::try_exists(&full)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (FsStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (FsStorage::new(dir.path().to_path_buf()), dir)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (storage, _dir) = storage();
        storage.put_object("pdfs/a.pdf", b"%PDF-1.7").await.unwrap();
        assert_eq!(
            storage.get_object("pdfs/a.pdf").await.unwrap(),
            b"%PDF-1.7"
        );
        assert!(storage.object_exists("pdfs/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let (storage, _dir) = storage();
        assert!(matches!(
            storage.get_object("pdfs/none.pdf").await,
            Err(PortError::NotFound(_))
        ));
        assert!(!storage.object_exists("pdfs/none.pdf").await.unwrap());
        assert!(matches!(
            storage.delete_object("pdfs/none.pdf").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_object() {
        let (storage, _dir) = storage();
        storage.put_object("pdfs/b.pdf", b"data").await.unwrap();
        storage.delete_object("pdfs/b.pdf").await.unwrap();
        assert!(!storage.object_exists("pdfs/b.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let (storage, _dir) = storage();
        for path in ["../outside.pdf", "/etc/passwd", "pdfs/../../outside", ""] {
            assert!(
                storage.put_object(path, b"x").await.is_err(),
                "'{path}' should be rejected"
            );
        }
    }
}
