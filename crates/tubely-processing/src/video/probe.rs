//! Stream inspection with ffprobe.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tubely_core::AspectClass;

use super::command::run_tool;
use crate::error::ProbeError;

/// Geometry of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn aspect(&self) -> AspectClass {
        AspectClass::from_dimensions(self.width, self.height)
    }
}

/// Reads the geometry of a local media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<VideoDimensions, ProbeError>;

    /// Orientation of the file's first video stream. Never falls back to a default class.
    async fn classify(&self, path: &Path) -> Result<AspectClass, ProbeError> {
        let dimensions = self.dimensions(path).await?;
        Ok(dimensions.aspect())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Pick the first video stream out of `ffprobe -print_format json -show_streams` output.
///
/// Streams are matched on `codec_type == "video"`. Output that omits
/// `codec_type` falls back to the first stream carrying both dimensions.
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoDimensions, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    if output.streams.is_empty() {
        return Err(ProbeError::NoStreams);
    }

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| {
            output
                .streams
                .iter()
                .find(|s| s.codec_type.is_none() && s.width.is_some() && s.height.is_some())
        })
        .ok_or(ProbeError::NoVideoStream)?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidDimensions { width, height });
    }

    Ok(VideoDimensions { width, height })
}

/// [`MediaProbe`] backed by the ffprobe binary.
#[derive(Clone, Debug)]
pub struct FfprobeProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn dimensions(&self, path: &Path) -> Result<VideoDimensions, ProbeError> {
        let start = std::time::Instant::now();

        let args = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = run_tool(&self.ffprobe_path, args, self.timeout).await?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                exit_code: output.status.code(),
                stderr: output.stderr_lossy(),
            });
        }

        let dimensions = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            width = dimensions.width,
            height = dimensions.height,
            aspect = %dimensions.aspect(),
            "Video probe completed"
        );

        Ok(dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_stream() {
        let json = br#"{"streams":[{"codec_type":"video","width":1920,"height":1080}]}"#;
        let dims = parse_probe_output(json).unwrap();
        assert_eq!(dims, VideoDimensions { width: 1920, height: 1080 });
        assert_eq!(dims.aspect(), AspectClass::Landscape);
    }

    #[test]
    fn test_skips_leading_audio_stream() {
        let json = br#"{"streams":[
            {"codec_type":"audio","sample_rate":"48000"},
            {"codec_type":"video","width":1080,"height":1920}
        ]}"#;
        assert_eq!(
            parse_probe_output(json).unwrap().aspect(),
            AspectClass::Portrait
        );
    }

    #[test]
    fn test_without_codec_type() {
        let json = br#"{"streams":[{"width":500,"height":500}]}"#;
        assert_eq!(parse_probe_output(json).unwrap().aspect(), AspectClass::Other);
    }

    #[test]
    fn test_zero_streams() {
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(ProbeError::NoStreams)
        ));
        assert!(matches!(parse_probe_output(b"{}"), Err(ProbeError::NoStreams)));
    }

    #[test]
    fn test_no_video_stream() {
        let json = br#"{"streams":[{"codec_type":"audio"}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(ProbeError::NoVideoStream)
        ));
    }

    #[test]
    fn test_zero_dimension() {
        let json = br#"{"streams":[{"codec_type":"video","width":1920,"height":0}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(ProbeError::InvalidDimensions { width: 1920, height: 0 })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProbeError::Parse(_))
        ));
        assert!(matches!(parse_probe_output(b""), Err(ProbeError::Parse(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let probe = FfprobeProbe::new("/nonexistent/ffprobe", Duration::from_secs(5));
        let err = probe.classify(Path::new("/tmp/x.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Spawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        // `false` ignores its arguments and exits 1
        let probe = FfprobeProbe::new("false", Duration::from_secs(5));
        let err = probe.classify(Path::new("/tmp/x.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Failed { exit_code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_parse_error() {
        let probe = FfprobeProbe::new("true", Duration::from_secs(5));
        let err = probe.classify(Path::new("/tmp/x.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }
}
