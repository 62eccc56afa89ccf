#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{S3Settings, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult, UrlResolver};
use std::sync::Arc;
use tubely_core::Config;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let settings = S3Settings::new(bucket, region)
                .with_endpoint(config.s3_endpoint().map(String::from));

            let storage = S3Storage::new(settings)?;
            tracing::info!(
                bucket = %storage.default_bucket(),
                endpoint = ?config.s3_endpoint(),
                "S3 storage backend initialized"
            );
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path.clone(), base_url).await?;
            tracing::info!(path = %base_path, "Local storage backend initialized");
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the URL resolver for the configured access mode
pub fn create_resolver(config: &Config, storage: Arc<dyn Storage>) -> UrlResolver {
    UrlResolver::new(config.url_mode(), storage)
        .with_cdn_base_url(config.cdn_base_url().map(String::from))
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tubely_core::config::PipelineConfig;
    use tubely_core::{StorageObject, UrlMode};

    #[tokio::test]
    async fn test_create_local_storage_and_resolver() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().to_string();
        let config = PipelineConfig::from_lookup(|name| match name {
            "STORAGE_BACKEND" => Some("local".to_string()),
            "LOCAL_STORAGE_PATH" => Some(path.clone()),
            "LOCAL_STORAGE_BASE_URL" => Some("http://localhost:8091/assets".to_string()),
            _ => None,
        })
        .unwrap();
        let config = Config(Box::new(config));

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);

        let resolver = create_resolver(&config, storage);
        assert_eq!(resolver.mode(), UrlMode::Static);
        let object = StorageObject::new(config.bucket(), "landscape/a.mp4", "video/mp4");
        assert_eq!(
            resolver.reference_for(&object),
            "http://localhost:8091/assets/tubely/landscape/a.mp4"
        );
    }
}
