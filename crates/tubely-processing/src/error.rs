//! Error types for the ingestion pipeline.

use std::io;
use std::time::Duration;
use thiserror::Error;
use tubely_core::{ErrorMetadata, LogLevel};
use tubely_storage::StorageError;

use crate::validator::ValidationError;
use crate::video::command::ToolError;

/// Failure of the stream inspector.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to execute ffprobe: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to read ffprobe output: {0}")]
    Io(#[source] io::Error),

    #[error("ffprobe exited with status {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffprobe did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No streams found")]
    NoStreams,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Invalid video dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Failure of the container remux.
#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("Failed to execute ffmpeg: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to read ffmpeg output: {0}")]
    Io(#[source] io::Error),

    #[error("ffmpeg exited with status {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffmpeg did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Remuxed output missing: {0}")]
    MissingOutput(#[source] io::Error),
}

impl From<ToolError> for ProbeError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Spawn(e) => ProbeError::Spawn(e),
            ToolError::Io(e) => ProbeError::Io(e),
            ToolError::TimedOut(deadline) => ProbeError::TimedOut(deadline),
        }
    }
}

impl From<ToolError> for RemuxError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Spawn(e) => RemuxError::Spawn(e),
            ToolError::Io(e) => RemuxError::Io(e),
            ToolError::TimedOut(deadline) => RemuxError::TimedOut(deadline),
        }
    }
}

/// Everything that can end an ingestion call. No reference is produced on any of these.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upload exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Could not inspect video: {0}")]
    Probe(#[from] ProbeError),

    #[error("Could not process video: {0}")]
    Remux(#[from] RemuxError),

    #[error("Could not upload file: {0}")]
    Storage(#[from] StorageError),

    #[error("Scratch file error: {0}")]
    Scratch(#[source] io::Error),
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        match self {
            IngestError::Validation(ValidationError::UnsupportedMediaType { .. }) => 415,
            IngestError::Validation(_) => 400,
            IngestError::PayloadTooLarge { .. } => 413,
            IngestError::Probe(_) | IngestError::Remux(_) => 422,
            IngestError::Storage(_) => 502,
            IngestError::Scratch(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "VALIDATION_ERROR",
            IngestError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            IngestError::Probe(_) => "PROBE_FAILED",
            IngestError::Remux(_) => "REMUX_FAILED",
            IngestError::Storage(_) => "STORAGE_ERROR",
            IngestError::Scratch(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::Storage(_)
                | IngestError::Probe(ProbeError::TimedOut(_))
                | IngestError::Remux(RemuxError::TimedOut(_))
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            IngestError::Validation(ValidationError::UnsupportedMediaType { .. }) => {
                Some("Upload a file with a supported media type")
            }
            IngestError::Validation(_) => Some("Check the upload and try again"),
            IngestError::PayloadTooLarge { .. } => Some("Upload a smaller file"),
            IngestError::Probe(_) | IngestError::Remux(_) => {
                Some("Check that the file is a valid, playable video")
            }
            IngestError::Storage(_) => Some("Retry the upload later"),
            IngestError::Scratch(_) => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Validation(e) => e.to_string(),
            IngestError::PayloadTooLarge { .. } => self.to_string(),
            IngestError::Probe(_) => "Could not read video dimensions".to_string(),
            IngestError::Remux(_) => "Could not process video for streaming".to_string(),
            IngestError::Storage(_) => "Could not upload file to storage".to_string(),
            IngestError::Scratch(_) => "Internal server error".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IngestError::Validation(_) | IngestError::PayloadTooLarge { .. } => LogLevel::Debug,
            IngestError::Probe(_) | IngestError::Remux(_) => LogLevel::Warn,
            IngestError::Storage(_) | IngestError::Scratch(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unsupported = IngestError::Validation(ValidationError::UnsupportedMediaType {
            media_type: "image/gif".to_string(),
            allowed: vec!["video/mp4".to_string()],
        });
        assert_eq!(unsupported.http_status_code(), 415);
        assert_eq!(unsupported.log_level(), LogLevel::Debug);

        let too_large = IngestError::PayloadTooLarge { limit: 10 };
        assert_eq!(too_large.http_status_code(), 413);

        let remux = IngestError::from(RemuxError::Failed {
            exit_code: Some(1),
            stderr: "moov atom not found".to_string(),
        });
        assert_eq!(remux.http_status_code(), 422);
        assert_eq!(remux.error_code(), "REMUX_FAILED");
        assert!(remux.to_string().contains("moov atom not found"));
        assert!(!remux.client_message().contains("moov"));

        let storage = IngestError::from(StorageError::UploadFailed("denied".to_string()));
        assert_eq!(storage.http_status_code(), 502);
        assert!(storage.is_recoverable());
    }

    #[test]
    fn test_tool_errors_keep_their_cause() {
        let probe = ProbeError::from(ToolError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));
        assert!(matches!(probe, ProbeError::Io(_)));
        assert!(probe.to_string().starts_with("Failed to read ffprobe output"));

        let probe = ProbeError::from(ToolError::Spawn(io::Error::new(
            io::ErrorKind::NotFound,
            "no such file",
        )));
        assert!(probe.to_string().starts_with("Failed to execute ffprobe"));

        let remux = RemuxError::from(ToolError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));
        assert!(matches!(remux, RemuxError::Io(_)));
        assert!(remux.to_string().starts_with("Failed to read ffmpeg output"));

        let remux = RemuxError::from(ToolError::TimedOut(Duration::from_secs(5)));
        assert!(matches!(remux, RemuxError::TimedOut(_)));
    }

    #[test]
    fn test_detailed_message_carries_source() {
        let err = IngestError::Scratch(io::Error::new(io::ErrorKind::Other, "disk full"));
        let message = tubely_core::error::detailed_message(&err);
        assert!(message.contains("disk full"));
    }
}
