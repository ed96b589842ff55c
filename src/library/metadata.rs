//! Per-course metadata record.
//!
//! Each course directory may hold a `metadata.json` file with fields an
//! educator entered by hand. Every field is optional; whatever is present
//! overrides the defaults derived from the directory name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

/// Reserved file name of the metadata record inside a course directory
pub const METADATA_FILE: &str = "metadata.json";

/// Category used when a course has none recorded
pub const DEFAULT_CATEGORY: &str = "General";

/// Optional, hand-entered course metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMetadata {
    /// Surrogate identifier assigned at creation; the directory name stays the primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CourseMetadata {
    /// Path of the metadata record for a course directory
    pub fn path_in(course_dir: &Path) -> PathBuf {
        course_dir.join(METADATA_FILE)
    }

    /// Read and parse the record; `Ok(None)` when the file does not exist
    pub async fn read(course_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(course_dir);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read metadata: {}", path.display()))
            }
        };

        let metadata = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata JSON: {}", path.display()))?;

        Ok(Some(metadata))
    }

    /// Load the record, treating missing or malformed files as absent
    pub async fn load_or_default(course_dir: &Path) -> Option<Self> {
        match Self::read(course_dir).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Using default course metadata: {:#}", e);
                None
            }
        }
    }

    /// Write the record atomically (temp file + rename).
    ///
    /// Each write stages into its own temp file, so concurrent saves to the
    /// same course never share a staging path; the last rename wins.
    pub async fn save(&self, course_dir: &Path) -> Result<()> {
        let path = Self::path_in(course_dir);
        let tmp = course_dir.join(format!(".{}.{}.tmp", METADATA_FILE, Uuid::new_v4().simple()));

        let content = serde_json::to_string_pretty(self)?;
        if let Err(e) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to write metadata: {}", tmp.display()));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace metadata: {}", path.display()));
        }

        Ok(())
    }

    /// Overlay every field present in `patch` onto `self`
    pub fn merge(&mut self, patch: CourseMetadata) {
        overlay(&mut self.uid, patch.uid);
        overlay(&mut self.title, patch.title);
        overlay(&mut self.description, patch.description);
        overlay(&mut self.instructor, patch.instructor);
        overlay(&mut self.category, patch.category);
        overlay(&mut self.level, patch.level);
        overlay(&mut self.duration, patch.duration);
        overlay(&mut self.created_at, patch.created_at);
        overlay(&mut self.updated_at, patch.updated_at);
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
