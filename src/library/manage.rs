//! Course and chapter creation, and metadata edits.
//!
//! These are the only operations that write to the content tree. Lecture
//! files themselves arrive through other channels (uploads, copying).

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use super::metadata::{CourseMetadata, METADATA_FILE};
use super::paths::{validate_segment, PathError};

/// Errors from course management
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Invalid name: {0}")]
    InvalidName(#[from] PathError),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] anyhow::Error),
}

/// Request to create a course
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    /// Directory name, which becomes the course ID
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub instructor: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,
}

/// Fields to change on an existing course; absent fields are left as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdate {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub instructor: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,
}

impl From<CourseUpdate> for CourseMetadata {
    fn from(update: CourseUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            instructor: update.instructor,
            category: update.category,
            level: update.level,
            duration: update.duration,
            ..Default::default()
        }
    }
}

/// Create `root/<name>/` and its metadata record. Returns the course ID.
pub async fn create_course(root: &Path, request: NewCourse) -> Result<String, CourseError> {
    let name = validate_segment(request.name.trim())?.to_string();
    let dir = root.join(&name);

    fs::create_dir_all(root).await?;
    match fs::create_dir(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CourseError::AlreadyExists(name));
        }
        Err(e) => return Err(e.into()),
    }

    let now = Utc::now();
    let metadata = CourseMetadata {
        uid: Some(Uuid::new_v4()),
        title: request.title.or_else(|| Some(name.clone())),
        description: request.description,
        instructor: request.instructor,
        category: request.category,
        level: request.level,
        duration: request.duration,
        created_at: Some(now),
        updated_at: Some(now),
    };
    initialize_course(&dir, &metadata).await?;

    tracing::info!("Created course {}", dir.display());
    Ok(name)
}

/// Write the first metadata record into a freshly created course directory,
/// removing the directory again if the write fails
async fn initialize_course(dir: &Path, metadata: &CourseMetadata) -> Result<(), CourseError> {
    if let Err(e) = metadata.save(dir).await {
        if let Err(cleanup) = fs::remove_dir_all(dir).await {
            tracing::warn!("Failed to remove incomplete course {}: {}", dir.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Merge `update` into the course's metadata record and bump `updatedAt`
pub async fn update_course(root: &Path, id: &str, update: CourseUpdate) -> Result<CourseMetadata, CourseError> {
    let dir = course_dir(root, id).await?;

    let mut metadata = CourseMetadata::load_or_default(&dir).await.unwrap_or_default();
    metadata.merge(update.into());
    metadata.updated_at = Some(Utc::now());
    metadata.save(&dir).await?;

    tracing::info!("Updated course metadata for {}", id);
    Ok(metadata)
}

/// Create an empty chapter directory inside a course
pub async fn create_chapter(root: &Path, course_id: &str, chapter: &str) -> Result<String, CourseError> {
    let course = course_dir(root, course_id).await?;
    let chapter = validate_segment(chapter.trim())?.to_string();

    if chapter == METADATA_FILE {
        return Err(PathError::InvalidSegment(chapter).into());
    }

    match fs::create_dir(course.join(&chapter)).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CourseError::AlreadyExists(format!("{}/{}", course_id, chapter)));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Created chapter {}/{}", course_id, chapter);
    Ok(chapter)
}

async fn course_dir(root: &Path, id: &str) -> Result<std::path::PathBuf, CourseError> {
    let dir = root.join(validate_segment(id)?);
    match fs::metadata(&dir).await {
        Ok(meta) if meta.is_dir() => Ok(dir),
        _ => Err(CourseError::CourseNotFound(id.to_string())),
    }
}
