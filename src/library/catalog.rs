//! Catalog of courses built from the content tree.
//!
//! The catalog is never persisted. Each call to [`Catalog::build`] walks
//! `root/<course>/<chapter>/<file>` afresh, so it always reflects what is
//! on disk right now. A writer racing with the walk (an upload in flight)
//! may be observed half-done; nothing here guards against that.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use super::media::MediaType;
use super::metadata::{CourseMetadata, DEFAULT_CATEGORY, METADATA_FILE};
use super::paths::{lecture_url, validate_segment};
use super::scan::{ScanLevel, ScanOptions, ScanWarning};

/// Fatal catalog failures. Per-subtree failures become [`ScanWarning`]s instead.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read content root {path}: {source}")]
    RootUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog scan exceeded {seconds}s")]
    Timeout { seconds: u64 },
}

/// Every course under the content root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Courses in directory-listing order
    pub courses: Vec<Course>,

    /// Subtrees skipped during the scan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScanWarning>,
}

/// A course directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Directory name (primary key)
    pub id: String,

    /// Directory name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,

    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    pub chapters: Vec<Chapter>,
}

/// A chapter directory inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub lectures: Vec<Lecture>,
}

/// A file inside a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub name: String,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// Size in bytes
    pub size: u64,

    /// Fetch URL, each segment percent-encoded
    pub url: String,
}

impl Course {
    /// A course with defaults derived from its directory name
    pub fn new(dir_name: impl Into<String>) -> Self {
        let dir_name = dir_name.into();
        Self {
            id: dir_name.clone(),
            title: dir_name.clone(),
            name: dir_name,
            uid: None,
            description: String::new(),
            instructor: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            level: None,
            duration: None,
            created_at: None,
            updated_at: None,
            chapters: Vec::new(),
        }
    }

    /// Apply a metadata record over the defaults
    pub fn with_metadata(mut self, metadata: CourseMetadata) -> Self {
        if let Some(title) = metadata.title {
            self.title = title;
        }
        if let Some(description) = metadata.description {
            self.description = description;
        }
        if let Some(instructor) = metadata.instructor {
            self.instructor = instructor;
        }
        if let Some(category) = metadata.category {
            self.category = category;
        }
        self.uid = metadata.uid;
        self.level = metadata.level;
        self.duration = metadata.duration;
        self.created_at = metadata.created_at;
        self.updated_at = metadata.updated_at;
        self
    }

    /// Total number of lectures across chapters
    pub fn lecture_count(&self) -> usize {
        self.chapters.iter().map(|c| c.lectures.len()).sum()
    }

    fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
            || self.instructor.to_lowercase().contains(query_lower)
    }
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the content root and build the catalog.
    ///
    /// A missing root gives an empty catalog. Unreadable course or chapter
    /// directories are skipped and recorded in `warnings`.
    pub async fn build(root: &Path, options: &ScanOptions) -> Result<Self, CatalogError> {
        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, Self::scan(root, options))
                .await
                .map_err(|_| CatalogError::Timeout {
                    seconds: limit.as_secs(),
                })?,
            None => Self::scan(root, options).await,
        }
    }

    async fn scan(root: &Path, options: &ScanOptions) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Content root {} does not exist yet", root.display());
                return Ok(catalog);
            }
            Err(source) => {
                return Err(CatalogError::RootUnreadable {
                    path: root.display().to_string(),
                    source,
                })
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(CatalogError::RootUnreadable {
                        path: root.display().to_string(),
                        source,
                    })
                }
            };

            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => {}
                Ok(_) => continue,
                Err(e) => {
                    catalog
                        .warnings
                        .push(ScanWarning::new(ScanLevel::Course, entry.path(), e));
                    continue;
                }
            }

            let Some(name) = entry_name(&entry, options, ScanLevel::Course, &mut catalog.warnings)
            else {
                continue;
            };

            if let Some(course) = scan_course(root, &name, options, &mut catalog.warnings).await {
                catalog.courses.push(course);
            }
        }

        Ok(catalog)
    }

    /// Build a single course by directory name; `None` if it does not exist
    pub async fn build_course(
        root: &Path,
        id: &str,
        options: &ScanOptions,
    ) -> Result<Option<Course>, CatalogError> {
        if validate_segment(id).is_err() {
            return Ok(None);
        }

        let dir = root.join(id);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Ok(None),
        }

        let mut warnings = Vec::new();
        let scan = scan_course(root, id, options, &mut warnings);

        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, scan)
                .await
                .map_err(|_| CatalogError::Timeout {
                    seconds: limit.as_secs(),
                }),
            None => Ok(scan.await),
        }
    }

    /// Get a course by ID
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Search courses by query (case-insensitive substring of title, description, instructor)
    pub fn search(&self, query: &str) -> Vec<&Course> {
        let query_lower = query.to_lowercase();
        self.courses
            .iter()
            .filter(|course| course.matches(&query_lower))
            .collect()
    }

    /// Filter courses by category (case-insensitive)
    pub fn filter_by_category(&self, category: &str) -> Vec<&Course> {
        self.query(None, Some(category))
    }

    /// Apply an optional search query and an optional category filter
    pub fn query(&self, query: Option<&str>, category: Option<&str>) -> Vec<&Course> {
        let query_lower = query.map(str::to_lowercase);
        let category_lower = category.map(str::to_lowercase);
        self.courses
            .iter()
            .filter(|course| query_lower.as_deref().map_or(true, |q| course.matches(q)))
            .filter(|course| {
                category_lower
                    .as_deref()
                    .map_or(true, |c| course.category.to_lowercase() == c)
            })
            .collect()
    }

    /// Distinct non-empty categories, sorted.
    ///
    /// Categories differing only in case collapse to the spelling of the
    /// first course that uses them, matching `filter_by_category`.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<(String, &str)> = self
            .courses
            .iter()
            .map(|c| c.category.as_str())
            .filter(|c| !c.is_empty())
            .map(|c| (c.to_lowercase(), c))
            .collect();
        categories.sort_by(|a, b| a.0.cmp(&b.0));
        categories.dedup_by(|a, b| a.0 == b.0);
        categories
            .into_iter()
            .map(|(_, category)| category.to_string())
            .collect()
    }

    /// Get the number of courses
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Name of a directory entry, or `None` if it is ignored or not UTF-8
fn entry_name(
    entry: &fs::DirEntry,
    options: &ScanOptions,
    level: ScanLevel,
    warnings: &mut Vec<ScanWarning>,
) -> Option<String> {
    let Ok(name) = entry.file_name().into_string() else {
        warnings.push(ScanWarning::new(level, entry.path(), "name is not valid UTF-8"));
        return None;
    };

    if options.is_ignored(&name) {
        return None;
    }

    Some(name)
}

async fn scan_course(
    root: &Path,
    course_name: &str,
    options: &ScanOptions,
    warnings: &mut Vec<ScanWarning>,
) -> Option<Course> {
    let course_dir = root.join(course_name);

    let mut entries = match fs::read_dir(&course_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warnings.push(ScanWarning::new(ScanLevel::Course, &course_dir, e));
            return None;
        }
    };

    let mut course = match CourseMetadata::load_or_default(&course_dir).await {
        Some(metadata) => Course::new(course_name).with_metadata(metadata),
        None => Course::new(course_name),
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warnings.push(ScanWarning::new(ScanLevel::Course, &course_dir, e));
                return None;
            }
        };

        match entry.file_type().await {
            Ok(ft) if ft.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                warnings.push(ScanWarning::new(ScanLevel::Chapter, entry.path(), e));
                continue;
            }
        }

        let Some(name) = entry_name(&entry, options, ScanLevel::Chapter, warnings) else {
            continue;
        };

        if name == METADATA_FILE {
            continue;
        }

        if let Some(chapter) = scan_chapter(&course_dir, course_name, &name, options, warnings).await
        {
            course.chapters.push(chapter);
        }
    }

    Some(course)
}

async fn scan_chapter(
    course_dir: &Path,
    course_name: &str,
    chapter_name: &str,
    options: &ScanOptions,
    warnings: &mut Vec<ScanWarning>,
) -> Option<Chapter> {
    let chapter_dir = course_dir.join(chapter_name);

    let mut entries = match fs::read_dir(&chapter_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warnings.push(ScanWarning::new(ScanLevel::Chapter, &chapter_dir, e));
            return None;
        }
    };

    let mut lectures = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warnings.push(ScanWarning::new(ScanLevel::Chapter, &chapter_dir, e));
                return None;
            }
        };

        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                warnings.push(ScanWarning::new(ScanLevel::Lecture, entry.path(), e));
                continue;
            }
        };

        // DirEntry::metadata does not follow symlinks, matching a plain readdir walk
        if !metadata.is_file() {
            continue;
        }

        let Some(name) = entry_name(&entry, options, ScanLevel::Lecture, warnings) else {
            continue;
        };

        lectures.push(Lecture {
            media_type: MediaType::from_path(&name),
            size: metadata.len(),
            url: lecture_url(&options.mount, course_name, chapter_name, &name),
            name,
        });
    }

    Some(Chapter {
        name: chapter_name.to_string(),
        lectures,
    })
}
