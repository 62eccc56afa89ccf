//! Upload pipeline and its request/outcome types.

pub mod pipeline;
pub mod types;

pub use pipeline::IngestPipeline;
pub use types::{IngestOutcome, ThumbnailOutcome, UploadRequest};
