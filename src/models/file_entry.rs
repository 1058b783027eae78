//! Represents a stored file as shown to the browser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display category derived from the file extension.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Pdf,
    Audio,
    Document,
    Presentation,
    File,
    /// Metadata could not be read.
    Unknown,
}

impl FileType {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let extension = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return FileType::File,
        };
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" => FileType::Image,
            "pdf" => FileType::Pdf,
            "mp4" | "webm" | "ogg" | "mov" | "avi" => FileType::Video,
            "mp3" | "wav" | "m4a" => FileType::Audio,
            "doc" | "docx" | "txt" => FileType::Document,
            "ppt" | "pptx" => FileType::Presentation,
            _ => FileType::File,
        }
    }
}

/// A single object inside a folder listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileEntry {
    /// Full object key.
    pub path: String,

    /// Final path segment.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    #[serde(rename = "type")]
    pub file_type: FileType,

    pub last_modified: Option<DateTime<Utc>>,
}

/// Metadata returned alongside preview URLs.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FileMetadata {
    pub exists: bool,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
}

/// Result of a successful upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadedObject {
    pub key: String,
    pub bucket: String,
    pub region: String,
    pub size: u64,
    pub mime_type: String,
}
