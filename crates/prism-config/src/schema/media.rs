//! Upload limits and accepted media types.

use serde::{Deserialize, Serialize};

/// Upload constraints for the image-to-text and video-to-text features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Hard upload limit in MiB (valid range: 1-2048).
    pub max_file_size_mb: u32,
    /// Videos above this size get a "may be slow" warning (valid range: 1-2048).
    pub video_warning_size_mb: u32,
    pub allowed_image_types: Vec<String>,
    pub allowed_video_types: Vec<String>,
}

impl MediaConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        u64::from(self.max_file_size_mb) * 1024 * 1024
    }

    pub fn video_warning_size_bytes(&self) -> u64 {
        u64::from(self.video_warning_size_mb) * 1024 * 1024
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            video_warning_size_mb: 50,
            allowed_image_types: ["image/jpeg", "image/png", "image/webp", "image/gif"]
                .map(String::from)
                .to_vec(),
            allowed_video_types: [
                "video/mp4",
                "video/mpeg",
                "video/webm",
                "video/quicktime",
                "video/x-msvideo",
                "video/x-flv",
                "video/3gpp",
                "video/x-matroska",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Text-to-image generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Images generated when the caller doesn't ask for a count.
    pub default_count: u32,
    /// Upper bound on images per request (valid range: 1-4).
    pub max_count: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            default_count: 1,
            max_count: 4,
        }
    }
}
