use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Orientation of a video, derived from its first video stream's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// Classify by the sign of `width / height - 1`.
    ///
    /// Compared on integers, so `1920x1080` and `1280x720` are landscape and
    /// non-standard sizes such as `1000x999` still classify correctly.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            Ordering::Greater => AspectClass::Landscape,
            Ordering::Less => AspectClass::Portrait,
            Ordering::Equal => AspectClass::Other,
        }
    }

    /// Legacy classification that only recognises exact 16:9 and 9:16 frames.
    #[deprecated(note = "brittle for non-standard resolutions; use AspectClass::from_dimensions")]
    pub fn from_exact_ratio(width: u32, height: u32) -> Self {
        let (w, h) = (u64::from(width), u64::from(height));
        if w == 16 * h / 9 {
            AspectClass::Landscape
        } else if h == 16 * w / 9 {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    /// Ratio label reported for the class.
    pub fn ratio_label(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "16:9",
            AspectClass::Portrait => "9:16",
            AspectClass::Other => "other",
        }
    }

    /// Path segment that groups stored objects by orientation.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl Display for AspectClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.key_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_sign_classification() {
        assert_eq!(AspectClass::from_dimensions(1920, 1080), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(1080, 1920), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(720, 720), AspectClass::Other);
    }

    #[test]
    fn test_non_standard_resolutions() {
        assert_eq!(AspectClass::from_dimensions(1000, 999), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(640, 1138), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(1440, 1080), AspectClass::Landscape);
    }

    #[test]
    #[allow(deprecated)]
    fn test_exact_ratio_only_matches_sixteen_nine() {
        assert_eq!(AspectClass::from_exact_ratio(1920, 1080), AspectClass::Landscape);
        assert_eq!(AspectClass::from_exact_ratio(1080, 1920), AspectClass::Portrait);
        // 4:3 is landscape by sign but "other" under the legacy rule
        assert_eq!(AspectClass::from_exact_ratio(1440, 1080), AspectClass::Other);
    }

    #[test]
    fn test_labels_and_prefixes() {
        assert_eq!(AspectClass::Landscape.ratio_label(), "16:9");
        assert_eq!(AspectClass::Portrait.ratio_label(), "9:16");
        assert_eq!(AspectClass::Other.key_prefix(), "other");
        assert_eq!(AspectClass::Portrait.to_string(), "portrait");
    }
}
