//! Data models for the ingestion pipeline
//!
//! `video` holds orientation classification; `storage` holds the stored object
//! and the shapes a persisted video URL can take.

mod storage;
mod video;

pub use storage::{SignedUrl, StorageObject, VideoUrlField};
pub use video::AspectClass;
