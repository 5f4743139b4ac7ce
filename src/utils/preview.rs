use serde::Serialize;
use utoipa::ToSchema;

/// Viewer family the presentation layer should use for a file.
///
/// Closed set with an explicit fallback; `from_extension` is total so every
/// extension maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Document,
    Text,
    Audio,
    Video,
    Unsupported,
}

impl PreviewKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "bmp" | "ico" | "avif" => {
                Self::Image
            }
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "ods" | "odp" => {
                Self::Document
            }
            "txt" | "md" | "csv" | "log" | "json" | "xml" | "yaml" | "yml" | "toml" | "html"
            | "css" | "js" | "ts" | "rs" | "py" => Self::Text,
            "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" => Self::Audio,
            "mp4" | "webm" | "mkv" | "avi" | "mov" | "m4v" => Self::Video,
            _ => Self::Unsupported,
        }
    }
}

/// Extension of a filename without the dot, lowercased. Empty when absent.
pub fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Fallback MIME resolution for uploads whose client-supplied type is
/// missing or generic.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}
