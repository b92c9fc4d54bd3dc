use crate::config::{DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES};
use crate::error::UploadError;
use crate::file::SelectedFile;

pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/heic",
    "image/heif",
    "image/webp",
];

pub const ACCEPTED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];

/// Extensions accepted when the declared type is missing or unknown
const EXTENSION_CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
];

/// Client-side limits checked before a file touches the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

/// Checks type and size of a file, returning the content type to upload with
///
/// The declared MIME type wins when it is accepted; otherwise the extension
/// decides.
///
/// # Errors
///
/// Returns `UploadError::Validation` for unsupported types and oversized files
pub fn validate_file(file: &SelectedFile, policy: &UploadPolicy) -> Result<String, UploadError> {
    let content_type = declared_type(file)
        .or_else(|| extension_type(file))
        .ok_or_else(|| UploadError::Validation("Unsupported file type.".to_string()))?;

    if file.size > policy.max_file_bytes {
        return Err(UploadError::Validation(format!(
            "File too large. Keep uploads under {}.",
            format_bytes(policy.max_file_bytes)
        )));
    }

    Ok(content_type)
}

fn declared_type(file: &SelectedFile) -> Option<String> {
    let mime = file.content_type.as_deref()?.trim().parse::<mime::Mime>().ok()?;
    let essence = mime.essence_str().to_lowercase();

    ACCEPTED_IMAGE_TYPES
        .iter()
        .chain(ACCEPTED_VIDEO_TYPES)
        .any(|accepted| *accepted == essence)
        .then_some(essence)
}

fn extension_type(file: &SelectedFile) -> Option<String> {
    let extension = file.extension()?;
    EXTENSION_CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| (*content_type).to_string())
}

/// Human-readable size, e.g. `100 MB` or `2.5 KB`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if size.fract() == 0.0 {
        format!("{size:.0} {}", UNITS[unit])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
