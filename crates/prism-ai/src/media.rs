//! Upload validation and inline encoding for image and video inputs.

use std::fmt;
use std::path::Path;

use base64::Engine as _;
use tracing::debug;

use crate::{AiError, Part};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Size limits and accepted MIME types for uploads.
#[derive(Debug, Clone)]
pub struct MediaPolicy {
    pub max_file_size_bytes: u64,
    pub video_warning_bytes: u64,
    pub allowed_image_types: Vec<String>,
    pub allowed_video_types: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * MIB,
            video_warning_bytes: 50 * MIB,
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

/// A validated upload, ready to be sent inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    pub kind: MediaKind,
    pub mime_type: String,
    /// Standard-alphabet base64 of the file bytes.
    pub data: String,
    pub size: u64,
    pub warning: Option<String>,
}

impl EncodedMedia {
    pub fn to_part(&self) -> Part {
        Part::InlineData {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// Guess a MIME type from a file extension.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" | "m4v" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "3gp" => "video/3gpp",
        "mkv" => "video/x-matroska",
        _ => return None,
    };
    Some(mime)
}

impl MediaPolicy {
    pub fn allowed_types(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.allowed_image_types,
            MediaKind::Video => &self.allowed_video_types,
        }
    }

    fn max_size_mb(&self) -> u64 {
        self.max_file_size_bytes / MIB
    }

    /// Resolve the MIME type of `path` and check it against the allowed list.
    pub fn resolve_mime(&self, kind: MediaKind, path: &Path) -> Result<String, AiError> {
        let allowed = self.allowed_types(kind);
        match mime_from_extension(path) {
            Some(mime) if allowed.iter().any(|t| t == mime) => Ok(mime.to_string()),
            _ => Err(AiError::InvalidMedia(format!(
                "Invalid file type. Allowed: {}.",
                allowed.join(", ")
            ))),
        }
    }

    /// Check a file size, returning an optional non-fatal warning.
    pub fn check_size(&self, kind: MediaKind, size: u64) -> Result<Option<String>, AiError> {
        if size > self.max_file_size_bytes {
            return Err(AiError::InvalidMedia(format!(
                "File is too large. Max size is {}MB.",
                self.max_size_mb()
            )));
        }

        let warning = (kind == MediaKind::Video && size > self.video_warning_bytes).then(|| {
            format!(
                "Warning: File size is large (>{}MB). Processing might be slow or fail.",
                self.video_warning_bytes / MIB
            )
        });
        Ok(warning)
    }

    /// Encode already-loaded bytes after validating type and size.
    pub fn encode(&self, kind: MediaKind, path: &Path, bytes: &[u8]) -> Result<EncodedMedia, AiError> {
        let mime_type = self.resolve_mime(kind, path)?;
        let size = bytes.len() as u64;
        let warning = self.check_size(kind, size)?;
        if bytes.is_empty() {
            return Err(AiError::InvalidMedia(
                "Failed to extract base64 string from file.".into(),
            ));
        }

        Ok(EncodedMedia {
            kind,
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            size,
            warning,
        })
    }

    /// Validate and encode a file from disk.
    ///
    /// Type and size are checked before the file is read.
    pub async fn load(&self, kind: MediaKind, path: &Path) -> Result<EncodedMedia, AiError> {
        self.resolve_mime(kind, path)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            AiError::InvalidMedia(format!("cannot read {}: {e}", path.display()))
        })?;
        self.check_size(kind, metadata.len())?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AiError::InvalidMedia(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(%kind, path = %path.display(), size = bytes.len(), "encoding media");
        self.encode(kind, path, &bytes)
    }
}
