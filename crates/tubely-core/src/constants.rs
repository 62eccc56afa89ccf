use std::time::Duration;

/// Validity window of every signed video URL.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Extension used when a media type does not split into `type/subtype`.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Key prefix for thumbnail objects.
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

/// Suffix appended to a scratch file path for the remuxed output.
pub const REMUX_OUTPUT_SUFFIX: &str = ".processing";
