use std::{
    collections::HashMap,
    io,
    path::{Component, Path, PathBuf},
    sync::RwLock,
};

use async_trait::async_trait;
use derive_more::Display;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

/// Errors raised by a blob store.
#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Stored file not found: {_0}")]
    NotFound(String),

    #[display("Invalid storage path: {_0}")]
    InvalidPath(String),

    #[display("Storage I/O failure: {_0}")]
    Io(io::Error),
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

/// Blob store addressed by relative paths such as `projects/4/<uuid>.png`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    /// Removing a missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Reports whether the store is usable, for health checks.
    async fn probe(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Rejects absolute paths and any `..` segment.
pub fn validate_relative_path(path: &str) -> Result<&Path, StorageError> {
    let candidate = Path::new(path);
    if path.is_empty() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(StorageError::InvalidPath(path.to_string())),
        }
    }
    Ok(candidate)
}

// ───── Filesystem ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemBackend { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(validate_relative_path(path)?))
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename into place.
        let temp_path = full_path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = file.write_all(data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path, bytes = data.len(), "Blob written");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.full_path(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.full_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(path, "Blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(&full_path).await?)
    }

    async fn probe(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        let metadata = fs::metadata(&self.root).await?;
        if metadata.permissions().readonly() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage root is read-only",
            )));
        }
        Ok(())
    }
}

// ───── In-memory ────────────────────────────────────────────────────

/// Keeps blobs in a map; used by tests and throwaway environments.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .blobs
            .read()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(path))
            .unwrap_or(false)
    }

    fn poisoned() -> StorageError {
        StorageError::Io(io::Error::other("memory store lock poisoned"))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_relative_path(path)?;
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;
        blobs.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_relative_path(path)?;
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        blobs
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        validate_relative_path(path)?;
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;
        blobs.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        validate_relative_path(path)?;
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        Ok(blobs.contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("portfolio-admin-{}", Uuid::new_v4()))
    }

    #[test]
    fn relative_paths_cannot_escape_the_root() {
        assert!(validate_relative_path("projects/1/a.png").is_ok());
        assert!(validate_relative_path("../secrets").is_err());
        assert!(validate_relative_path("projects/../../etc/passwd").is_err());
        assert!(validate_relative_path("/etc/passwd").is_err());
        assert!(validate_relative_path("").is_err());
    }

    #[actix_rt::test]
    async fn filesystem_backend_round_trips_and_deletes() {
        let root = scratch_root();
        let backend = FilesystemBackend::new(&root);

        backend.write("projects/7/cover.png", b"png-bytes").await.unwrap();
        assert!(backend.exists("projects/7/cover.png").await.unwrap());
        assert_eq!(backend.read("projects/7/cover.png").await.unwrap(), b"png-bytes");

        let leftovers: Vec<_> = std::fs::read_dir(root.join("projects/7"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        backend.delete("projects/7/cover.png").await.unwrap();
        assert!(!backend.exists("projects/7/cover.png").await.unwrap());
        backend.delete("projects/7/cover.png").await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }

    #[actix_rt::test]
    async fn filesystem_backend_reports_missing_blobs() {
        let backend = FilesystemBackend::new(scratch_root());

        let err = backend.read("nothing/here.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn memory_backend_tracks_paths() {
        let backend = MemoryBackend::new();

        backend.write("dev_profile/1/b.pdf", b"%PDF").await.unwrap();
        backend.write("dev_profile/1/a.png", b"png").await.unwrap();
        assert_eq!(backend.paths(), vec!["dev_profile/1/a.png", "dev_profile/1/b.pdf"]);

        backend.delete("dev_profile/1/a.png").await.unwrap();
        assert!(!backend.contains("dev_profile/1/a.png"));
        assert!(backend.write("../x", b"").await.is_err());
    }
}
