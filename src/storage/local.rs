use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::{
    errors::{AppError, Result},
    storage::Storage,
};

/// Stores uploads as plain files under a base directory.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AppError::Storage(format!("Failed to create storage directory: {}", e)))?;

        Ok(Self { base_path })
    }

    /// Resolves a relative object path, refusing anything that could escape the base directory.
    fn get_full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(AppError::Storage(format!("Invalid storage path: {}", path)));
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to remove file: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_operations() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        let test_data = b"Hello, World!";
        let test_path = "nested/file.txt";

        storage.store(test_path, test_data).await.unwrap();
        let full_path = temp_dir.path().join(test_path);
        assert_eq!(std::fs::read(&full_path).unwrap(), test_data);

        storage.remove(test_path).await.unwrap();
        assert!(!full_path.exists());

        // Removing twice is fine.
        storage.remove(test_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_base_directory() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("uploads")).unwrap();

        for path in ["../outside.txt", "/etc/passwd", "a/../../b", ""] {
            assert!(storage.store(path, b"x").await.is_err(), "{path}");
            assert!(storage.remove(path).await.is_err(), "{path}");
        }
        assert!(!temp_dir.path().join("outside.txt").exists());
    }
}
