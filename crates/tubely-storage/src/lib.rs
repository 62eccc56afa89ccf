//! Tubely Storage Library
//!
//! This crate provides the storage abstraction used by the ingestion pipeline,
//! its S3 and local filesystem implementations, storage key derivation, and
//! the URL resolver that turns persisted references into retrievable URLs.
//!
//! # Storage key format
//!
//! Video keys are `{orientation}/{token}{extension}`, thumbnail keys are
//! `thumbnails/{token}{extension}`, where `token` is 32 random bytes encoded as
//! URL-safe base64. Keys must not contain `..`, a leading `/`, or a comma (the
//! composite `bucket,key` reference has no escaping). Key generation is
//! centralized in the `keys` module so all callers stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_resolver, create_storage};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use resolver::{ResolvedUrl, UrlResolver};
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use traits::{ByteReader, Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
