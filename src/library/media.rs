//! Media classification for lecture files.
//!
//! A lecture's type is a pure function of its file extension, matched
//! case-insensitively against fixed allow-lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions served to the video player
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi", "wmv", "flv", "mkv"];

/// Extensions served to the PDF viewer
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions served to the audio player
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Type of lecture media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Video lecture
    Video,

    /// PDF document
    Pdf,

    /// Audio recording
    Audio,

    /// Anything else (slides, archives, unknown)
    Other,
}

impl MediaType {
    /// Classify an extension (without the leading dot)
    pub fn classify(extension: &str) -> Self {
        let ext = extension.to_ascii_lowercase();
        let ext = ext.as_str();

        if VIDEO_EXTENSIONS.contains(&ext) {
            MediaType::Video
        } else if PDF_EXTENSIONS.contains(&ext) {
            MediaType::Pdf
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            MediaType::Audio
        } else {
            MediaType::Other
        }
    }

    /// Classify a file by the extension of its path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::classify)
            .unwrap_or(MediaType::Other)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Pdf => write!(f, "pdf"),
            MediaType::Audio => write!(f, "audio"),
            MediaType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "video" => Ok(MediaType::Video),
            "pdf" => Ok(MediaType::Pdf),
            "audio" => Ok(MediaType::Audio),
            "other" => Ok(MediaType::Other),
            _ => anyhow::bail!("Unknown media type: {}", s),
        }
    }
}
