//! Upload pipeline: validate → spool → classify → remux → store.
//!
//! Every stage returns `Result` and is chained with `?`, so the first failure
//! ends the call without touching the object store afterwards. Scratch files
//! are owned by guards and removed on every exit path.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use tubely_core::{Config, StorageObject};
use tubely_storage::keys::{apply_orientation, derive_base_key, thumbnail_key};
use tubely_storage::{ByteReader, Storage, UrlResolver};

use super::types::{IngestOutcome, ThumbnailOutcome, UploadRequest};
use crate::error::IngestError;
use crate::scratch::ScratchFile;
use crate::validator::MediaValidator;
use crate::video::{FfmpegRemuxer, FfprobeProbe, MediaProbe, MediaRemuxer};

const SCRATCH_PREFIX: &str = "tubely-upload-";

/// Ingestion pipeline for video and thumbnail uploads.
///
/// Holds no per-request state, so one instance serves concurrent calls.
#[derive(Clone)]
pub struct IngestPipeline {
    storage: Arc<dyn Storage>,
    resolver: UrlResolver,
    probe: Arc<dyn MediaProbe>,
    remuxer: Arc<dyn MediaRemuxer>,
    bucket: String,
    scratch_dir: PathBuf,
    video_validator: MediaValidator,
    thumbnail_validator: MediaValidator,
}

impl IngestPipeline {
    /// Pipeline with the ffprobe/ffmpeg tools and limits taken from configuration.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>, resolver: UrlResolver) -> Self {
        Self {
            storage,
            resolver,
            probe: Arc::new(FfprobeProbe::new(
                config.ffprobe_path(),
                config.tool_timeout(),
            )),
            remuxer: Arc::new(FfmpegRemuxer::new(
                config.ffmpeg_path(),
                config.tool_timeout(),
            )),
            bucket: config.bucket().to_string(),
            scratch_dir: config.scratch_dir().to_path_buf(),
            video_validator: MediaValidator::new(
                config.max_video_size_bytes(),
                config.video_allowed_content_types().to_vec(),
            ),
            thumbnail_validator: MediaValidator::new(
                config.max_thumbnail_size_bytes(),
                config.thumbnail_allowed_content_types().to_vec(),
            ),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_remuxer(mut self, remuxer: Arc<dyn MediaRemuxer>) -> Self {
        self.remuxer = remuxer;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn with_video_validator(mut self, validator: MediaValidator) -> Self {
        self.video_validator = validator;
        self
    }

    pub fn with_thumbnail_validator(mut self, validator: MediaValidator) -> Self {
        self.thumbnail_validator = validator;
        self
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Ingest a video upload and return the value to persist as its `video_url`.
    #[tracing::instrument(skip(self, request), fields(
        owner_id = %request.owner_id,
        video_id = %request.video_id,
        media_type = %request.media_type
    ))]
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestOutcome, IngestError> {
        let start = std::time::Instant::now();
        let media_type = self
            .video_validator
            .validate_content_type(&request.media_type)?;

        let (raw, size) = self
            .spool(request.body, self.video_validator.max_file_size())
            .await?;
        self.video_validator.validate_file_size(size)?;

        let aspect = self.probe.classify(raw.path()).await?;
        let processed = self.remuxer.remux(raw.path()).await?;

        let key = apply_orientation(&derive_base_key(&media_type), aspect);
        let reader = open_reader(&processed).await?;
        let size_bytes = self
            .storage
            .put_stream(&self.bucket, &key, &media_type, reader)
            .await?;

        let object = StorageObject::new(self.bucket.clone(), key, media_type);
        let video_url = self.resolver.reference_for(&object);

        tracing::info!(
            bucket = %object.bucket,
            key = %object.key,
            aspect = %aspect,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingested"
        );

        Ok(IngestOutcome {
            video_id: request.video_id,
            video_url,
            object,
            aspect,
            aspect_ratio: aspect.ratio_label(),
            size_bytes,
        })
    }

    /// Ingest a thumbnail image and return the value to persist as its `thumbnail_url`.
    #[tracing::instrument(skip(self, request), fields(
        owner_id = %request.owner_id,
        video_id = %request.video_id,
        media_type = %request.media_type
    ))]
    pub async fn ingest_thumbnail(
        &self,
        request: UploadRequest,
    ) -> Result<ThumbnailOutcome, IngestError> {
        let media_type = self
            .thumbnail_validator
            .validate_content_type(&request.media_type)?;

        let (raw, size) = self
            .spool(request.body, self.thumbnail_validator.max_file_size())
            .await?;
        self.thumbnail_validator.validate_file_size(size)?;

        let key = thumbnail_key(&media_type);
        let reader = open_reader(&raw).await?;
        let size_bytes = self
            .storage
            .put_stream(&self.bucket, &key, &media_type, reader)
            .await?;

        let object = StorageObject::new(self.bucket.clone(), key, media_type);
        let thumbnail_url = self.resolver.reference_for(&object);

        tracing::info!(
            bucket = %object.bucket,
            key = %object.key,
            size_bytes = size_bytes,
            "Thumbnail ingested"
        );

        Ok(ThumbnailOutcome {
            video_id: request.video_id,
            thumbnail_url,
            object,
            size_bytes,
        })
    }

    /// Copy the request body into a fresh scratch file, failing once `limit` bytes are exceeded.
    async fn spool(
        &self,
        body: ByteReader,
        limit: u64,
    ) -> Result<(ScratchFile, u64), IngestError> {
        let (scratch, mut file) =
            ScratchFile::create(&self.scratch_dir, SCRATCH_PREFIX).map_err(IngestError::Scratch)?;

        let mut limited = body.take(limit.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(IngestError::Scratch)?;
        if written > limit {
            tracing::debug!(limit = limit, "Upload exceeded size limit");
            return Err(IngestError::PayloadTooLarge { limit });
        }

        file.flush().await.map_err(IngestError::Scratch)?;
        Ok((scratch, written))
    }
}

async fn open_reader(scratch: &ScratchFile) -> Result<ByteReader, IngestError> {
    let file = tokio::fs::File::open(scratch.path())
        .await
        .map_err(IngestError::Scratch)?;
    Ok(Box::pin(file))
}
