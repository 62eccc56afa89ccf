/// Common validation errors for uploads
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid media type: {0}")]
    MalformedMediaType(String),

    #[error("Unsupported media type: {media_type} (allowed: {allowed:?})")]
    UnsupportedMediaType {
        media_type: String,
        allowed: Vec<String>,
    },

    #[error("Empty file")]
    EmptyFile,
}

/// Strip parameters and lower-case a declared media type.
///
/// `Video/MP4; codecs="avc1"` becomes `video/mp4`. Returns `None` when the
/// essence is not `type/subtype`.
pub fn normalize_media_type(raw: &str) -> Option<String> {
    let essence = raw.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    Some(essence.to_lowercase())
}

/// Upload validator
///
/// Holds the size limit and media type allow-list for one kind of upload.
#[derive(Clone, Debug)]
pub struct MediaValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate the declared media type, returning its normalized form.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let normalized = normalize_media_type(content_type)
            .ok_or_else(|| ValidationError::MalformedMediaType(content_type.to_string()))?;

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::UnsupportedMediaType {
                media_type: normalized,
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(normalized)
    }

    /// Validate the number of bytes received. The upper bound is enforced while streaming.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        Ok(())
    }
}
