use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// An object written to the store by one successful upload. Never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
}

impl StorageObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            content_type: content_type.into(),
        }
    }

    /// Composite `bucket,key` reference persisted when URLs are signed at read time.
    pub fn composite_ref(&self) -> String {
        VideoUrlField::Composite {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
        }
        .to_string()
    }
}

/// Shape of the `video_url` value stored on a video record.
///
/// The composite wire form is exactly `"{bucket},{key}"` with no escaping, so
/// neither part may contain a comma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoUrlField {
    Empty,
    /// A fully-qualified URL, or any value that is not a well-formed composite.
    Direct(String),
    Composite { bucket: String, key: String },
}

impl VideoUrlField {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return VideoUrlField::Empty;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return VideoUrlField::Direct(raw.to_string());
        }

        let parts: Vec<&str> = raw.split(',').collect();
        match parts.as_slice() {
            [bucket, key] if !bucket.is_empty() && !key.is_empty() => VideoUrlField::Composite {
                bucket: (*bucket).to_string(),
                key: (*key).to_string(),
            },
            _ => VideoUrlField::Direct(raw.to_string()),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, VideoUrlField::Composite { .. })
    }
}

impl Display for VideoUrlField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoUrlField::Empty => Ok(()),
            VideoUrlField::Direct(url) => write!(f, "{}", url),
            VideoUrlField::Composite { bucket, key } => write!(f, "{},{}", bucket, key),
        }
    }
}

/// A time-limited read URL. Derived on every read and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn new(url: String, issued_at: DateTime<Utc>, ttl: std::time::Duration) -> Self {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());
        Self {
            url,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    /// Validity window as issued.
    pub fn ttl(&self) -> ChronoDuration {
        self.expires_at - self.issued_at
    }
}
