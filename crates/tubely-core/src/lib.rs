//! Tubely Core Library
//!
//! This crate provides the domain models, configuration and error presentation
//! types shared by the storage, processing and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel};
pub use models::{AspectClass, SignedUrl, StorageObject, VideoUrlField};
pub use storage_types::{StorageBackend, UrlMode};
