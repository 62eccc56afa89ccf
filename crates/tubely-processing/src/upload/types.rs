//! Types for the upload pipeline.

use serde::Serialize;
use std::fmt;
use tokio::io::AsyncRead;
use tubely_core::{AspectClass, StorageObject};
use tubely_storage::ByteReader;
use uuid::Uuid;

/// One inbound upload. Consumed by a single pipeline call.
pub struct UploadRequest {
    pub owner_id: Uuid,
    pub video_id: Uuid,
    /// Declared media type, parameters allowed (`video/mp4; codecs=...`).
    pub media_type: String,
    pub body: ByteReader,
}

impl UploadRequest {
    pub fn new<R>(owner_id: Uuid, video_id: Uuid, media_type: impl Into<String>, body: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            owner_id,
            video_id,
            media_type: media_type.into(),
            body: Box::pin(body),
        }
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("owner_id", &self.owner_id)
            .field("video_id", &self.video_id)
            .field("media_type", &self.media_type)
            .finish_non_exhaustive()
    }
}

/// Result of a successful video ingestion.
#[derive(Clone, Debug, Serialize)]
pub struct IngestOutcome {
    pub video_id: Uuid,
    /// Value to persist as the video record's `video_url`.
    pub video_url: String,
    pub object: StorageObject,
    pub aspect: AspectClass,
    pub aspect_ratio: &'static str,
    pub size_bytes: u64,
}

/// Result of a successful thumbnail ingestion.
#[derive(Clone, Debug, Serialize)]
pub struct ThumbnailOutcome {
    pub video_id: Uuid,
    /// Value to persist as the video record's `thumbnail_url`.
    pub thumbnail_url: String,
    pub object: StorageObject,
    pub size_bytes: u64,
}
