//! Shared key generation for storage backends.
//!
//! Key format: `{orientation}/{token}{extension}` for videos and
//! `thumbnails/{token}{extension}` for thumbnails. Every function here is a pure
//! string transform apart from the random token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use tubely_core::constants::{FALLBACK_EXTENSION, THUMBNAIL_PREFIX};
use tubely_core::AspectClass;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const TOKEN_BYTES: usize = 32;

/// 32 bytes from the thread-local CSPRNG, URL-safe base64 without padding.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// File extension for a declared media type.
///
/// `video/mp4` yields `.mp4`. Anything that does not split into exactly
/// `type/subtype` yields the `.bin` fallback.
pub fn extension_for(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    match parts.as_slice() {
        [_, subtype] => format!(".{}", subtype),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// Random token followed by the media type's extension.
pub fn derive_base_key(media_type: &str) -> String {
    format!("{}{}", random_token(), extension_for(media_type))
}

/// Prefix a base key with the orientation path segment.
pub fn apply_orientation(base_key: &str, aspect: AspectClass) -> String {
    format!("{}/{}", aspect.key_prefix(), base_key)
}

/// Key for a thumbnail image.
pub fn thumbnail_key(media_type: &str) -> String {
    format!("{}/{}", THUMBNAIL_PREFIX, derive_base_key(media_type))
}

/// Legacy key built from the video identifier instead of a random token.
///
/// Re-uploads for the same video collide under this scheme.
#[deprecated(note = "keys must be unique per upload; use derive_base_key")]
pub fn video_scoped_key(video_id: Uuid, media_type: &str) -> String {
    format!("{}{}", video_id, extension_for(media_type))
}

/// Reject keys that could escape a storage root or break the composite reference format.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.contains(',') {
        return Err(StorageError::InvalidKey(
            "Storage key must not contain a comma".to_string(),
        ));
    }
    Ok(())
}
