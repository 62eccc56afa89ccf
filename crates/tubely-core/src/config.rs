//! Configuration module
//!
//! This module provides the configuration for the ingestion pipeline: storage
//! backend and access mode, external tool locations, and upload limits.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::{StorageBackend, UrlMode};

// Common constants
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const BYTES_PER_MB: u64 = 1024 * 1024;
const TOOL_TIMEOUT_SECS: u64 = 300;

/// Base configuration shared by every entry point
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
}

/// Ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub url_mode: UrlMode,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub cdn_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Media processing configuration
    pub scratch_dir: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub tool_timeout_secs: u64,
    pub max_video_size_mb: u64,
    pub video_allowed_content_types: Vec<String>,
    pub max_thumbnail_size_mb: u64,
    pub thumbnail_allowed_content_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    fn as_pipeline(&self) -> &PipelineConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_pipeline().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = PipelineConfig::from_lookup(|name| env::var(name).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_pipeline().validate()
    }

    // Convenience getters for common fields
    pub fn environment(&self) -> &str {
        &self.as_pipeline().base.environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_pipeline().storage_backend
    }

    pub fn url_mode(&self) -> UrlMode {
        self.as_pipeline().url_mode
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_pipeline().s3_bucket.as_deref()
    }

    /// `S3_REGION`, falling back to `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.as_pipeline()
            .s3_region
            .as_deref()
            .or(self.as_pipeline().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_pipeline().s3_endpoint.as_deref()
    }

    pub fn cdn_base_url(&self) -> Option<&str> {
        self.as_pipeline().cdn_base_url.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_pipeline().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_pipeline().local_storage_base_url.as_deref()
    }

    /// Bucket name objects are written to. Local storage uses it as a top-level directory.
    pub fn bucket(&self) -> &str {
        self.s3_bucket().unwrap_or("tubely")
    }

    pub fn scratch_dir(&self) -> &std::path::Path {
        &self.as_pipeline().scratch_dir
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_pipeline().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_pipeline().ffmpeg_path
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.as_pipeline().tool_timeout_secs)
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_pipeline()
            .max_video_size_mb
            .saturating_mul(BYTES_PER_MB)
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.as_pipeline().video_allowed_content_types
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.as_pipeline()
            .max_thumbnail_size_mb
            .saturating_mul(BYTES_PER_MB)
    }

    pub fn thumbnail_allowed_content_types(&self) -> &[String] {
        &self.as_pipeline().thumbnail_allowed_content_types
    }
}

fn parse_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl PipelineConfig {
    /// Build the configuration from a variable lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let base = BaseConfig { environment };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::S3,
        };

        let url_mode = match var("VIDEO_URL_MODE") {
            Some(raw) => raw.parse()?,
            None => UrlMode::Static,
        };

        let config = PipelineConfig {
            base,
            storage_backend,
            url_mode,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            cdn_base_url: var("S3_CF_DISTRIBUTION").or_else(|| var("CDN_BASE_URL")),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            scratch_dir: var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            tool_timeout_secs: var("TOOL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(TOOL_TIMEOUT_SECS),
            max_video_size_mb: var("MAX_VIDEO_SIZE_MB")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_VIDEO_SIZE_MB),
            video_allowed_content_types: parse_list(
                var("VIDEO_ALLOWED_CONTENT_TYPES").unwrap_or_else(|| "video/mp4".to_string()),
            ),
            max_thumbnail_size_mb: var("MAX_THUMBNAIL_SIZE_MB")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_THUMBNAIL_SIZE_MB),
            thumbnail_allowed_content_types: parse_list(
                var("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| "image/jpeg,image/png".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("TOOL_TIMEOUT_SECS must be greater than zero"));
        }

        for (name, mb) in [
            ("MAX_VIDEO_SIZE_MB", self.max_video_size_mb),
            ("MAX_THUMBNAIL_SIZE_MB", self.max_thumbnail_size_mb),
        ] {
            if mb == 0 || mb.checked_mul(BYTES_PER_MB).is_none() {
                return Err(anyhow::anyhow!(
                    "{} must be between 1 and {}",
                    name,
                    u64::MAX / BYTES_PER_MB
                ));
            }
        }

        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must list at least one media type"
            ));
        }

        if self.url_mode == UrlMode::Signed && self.storage_backend != StorageBackend::S3 {
            return Err(anyhow::anyhow!(
                "VIDEO_URL_MODE=signed requires the S3 storage backend"
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
                if let Some(bucket) = &self.s3_bucket {
                    if bucket.contains(',') {
                        return Err(anyhow::anyhow!("S3_BUCKET must not contain a comma"));
                    }
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_s3_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "tubely-videos"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert_eq!(config.url_mode, UrlMode::Static);
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.video_allowed_content_types, vec!["video/mp4"]);

        let config = Config(Box::new(config));
        assert_eq!(config.max_video_size_bytes(), 1 << 30);
        assert_eq!(config.max_thumbnail_size_bytes(), 10 << 20);
        assert_eq!(config.s3_region(), Some("us-east-1"));
        assert_eq!(config.bucket(), "tubely-videos");
        assert!(!config.is_production());
    }

    #[test]
    fn test_s3_requires_bucket() {
        let result = PipelineConfig::from_lookup(lookup(&[("AWS_REGION", "us-east-1")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_signed_mode_requires_s3() {
        let result = PipelineConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "local"),
            ("VIDEO_URL_MODE", "signed"),
            ("LOCAL_STORAGE_PATH", "/tmp/tubely"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/assets"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_local_backend() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/tubely"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/assets"),
            ("VIDEO_ALLOWED_CONTENT_TYPES", "video/mp4, Video/QuickTime"),
            ("TOOL_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(
            config.video_allowed_content_types,
            vec!["video/mp4", "video/quicktime"]
        );
        assert_eq!(Config(Box::new(config)).tool_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_url_mode_rejected() {
        let result = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "b"),
            ("S3_REGION", "eu-west-1"),
            ("VIDEO_URL_MODE", "sometimes"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_size_limit_overflow_rejected() {
        let huge = u64::MAX.to_string();
        let result = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "b"),
            ("S3_REGION", "eu-west-1"),
            ("MAX_VIDEO_SIZE_MB", huge.as_str()),
        ]));
        assert!(result.is_err());

        let result = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "b"),
            ("S3_REGION", "eu-west-1"),
            ("MAX_THUMBNAIL_SIZE_MB", "17592186044416"),
        ]));
        assert!(result.is_err());

        let config = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "b"),
            ("S3_REGION", "eu-west-1"),
            ("MAX_THUMBNAIL_SIZE_MB", "17592186044415"),
        ]))
        .unwrap();
        assert_eq!(
            Config(Box::new(config)).max_thumbnail_size_bytes(),
            17592186044415 * 1024 * 1024
        );
    }
}
