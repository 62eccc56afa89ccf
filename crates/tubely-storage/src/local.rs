use crate::keys::validate_key;
use crate::traits::{ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}` and are served from
/// `{base_url}/{bucket}/{key}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/assets")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert bucket and key to a filesystem path inside the storage root
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty()
            || bucket.contains('/')
            || bucket.contains("..")
            || bucket.contains(',')
        {
            return Err(StorageError::InvalidKey(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }
        validate_key(key)?;

        let path = self.base_path.join(bucket).join(key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        mut reader: ByteReader,
    ) -> StorageResult<u64> {
        let path = self.object_path(bucket, key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    key = %key,
                    "Local storage stream upload failed"
                );
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(written)
    }

    async fn presigned_get_url(
        &self,
        _bucket: &str,
        _key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Presigned URLs are not supported by local storage".to_string(),
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_storage() -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8091/assets/".to_string(),
        )
        .await
        .unwrap();
        (storage, temp_dir)
    }

    fn reader(data: &[u8]) -> ByteReader {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    #[tokio::test]
    async fn test_put_stream_writes_file() {
        let (storage, temp_dir) = create_test_storage().await;
        let data = b"fake mp4 bytes";

        let written = storage
            .put_stream("tubely", "landscape/abc.mp4", "video/mp4", reader(data))
            .await
            .unwrap();

        assert_eq!(written, data.len() as u64);
        let on_disk = tokio::fs::read(temp_dir.path().join("tubely/landscape/abc.mp4"))
            .await
            .unwrap();
        assert_eq!(on_disk, data);
    }

    #[tokio::test]
    async fn test_public_url() {
        let (storage, _temp_dir) = create_test_storage().await;
        assert_eq!(
            storage.public_url("tubely", "portrait/xyz.mp4"),
            "http://localhost:8091/assets/tubely/portrait/xyz.mp4"
        );
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (storage, _temp_dir) = create_test_storage().await;

        let result = storage
            .put_stream("tubely", "../../etc/passwd", "video/mp4", reader(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .put_stream("..", "landscape/a.mp4", "video/mp4", reader(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_presign_unsupported() {
        let (storage, _temp_dir) = create_test_storage().await;
        let result = storage
            .presigned_get_url("tubely", "landscape/abc.mp4", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
