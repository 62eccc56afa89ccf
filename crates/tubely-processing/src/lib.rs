//! Tubely Processing Library
//!
//! This crate turns an inbound upload into a stored object: it validates the
//! declared media type, spools the body to a scratch file, classifies the video
//! orientation with ffprobe, remuxes it with ffmpeg so playback can start
//! before the download completes, and uploads the result under an
//! orientation-prefixed random key.

pub mod error;
pub mod scratch;
pub mod upload;
pub mod validator;
pub mod video;

pub use error::{IngestError, ProbeError, RemuxError};
pub use scratch::ScratchFile;
pub use upload::{IngestOutcome, IngestPipeline, ThumbnailOutcome, UploadRequest};
pub use validator::{normalize_media_type, MediaValidator, ValidationError};
pub use video::{FfmpegRemuxer, FfprobeProbe, MediaProbe, MediaRemuxer, VideoDimensions};
