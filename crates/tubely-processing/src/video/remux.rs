//! Container remux for progressive playback.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::constants::REMUX_OUTPUT_SUFFIX;

use super::command::run_tool;
use crate::error::RemuxError;
use crate::scratch::ScratchFile;

/// Path the remuxed copy of `input` is written to.
pub fn remux_output_path(input: &Path) -> PathBuf {
    let mut raw: OsString = input.as_os_str().to_owned();
    raw.push(REMUX_OUTPUT_SUFFIX);
    PathBuf::from(raw)
}

/// Rewrites a local media file so it can start playing before it is fully downloaded.
#[async_trait]
pub trait MediaRemuxer: Send + Sync {
    /// Returns the guard of the output file. It is removed when the guard drops,
    /// including when this call fails part way through.
    async fn remux(&self, input: &Path) -> Result<ScratchFile, RemuxError>;
}

/// [`MediaRemuxer`] backed by ffmpeg stream copy with the `moov` atom moved to the front.
#[derive(Clone, Debug)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> Result<ScratchFile, RemuxError> {
        let start = std::time::Instant::now();
        let output = ScratchFile::adopt(remux_output_path(input));

        let args = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output.path().as_os_str(),
        ];
        let result = run_tool(&self.ffmpeg_path, args, self.timeout).await?;

        if !result.status.success() {
            let stderr = result.stderr_lossy();
            tracing::warn!(
                exit_code = ?result.status.code(),
                stderr = %stderr,
                "ffmpeg remux failed"
            );
            return Err(RemuxError::Failed {
                exit_code: result.status.code(),
                stderr,
            });
        }

        let metadata = tokio::fs::metadata(output.path())
            .await
            .map_err(RemuxError::MissingOutput)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            size_bytes = metadata.len(),
            "Video remux completed"
        );

        Ok(output)
    }
}
