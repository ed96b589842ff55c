//! Options and diagnostics for catalog traversal.
//!
//! Controls which entries a scan skips, under which URL mount lecture
//! files are published, and how long a single traversal may run.

use std::path::PathBuf;
use std::time::Duration;

use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Default URL mount for lecture files
pub const DEFAULT_MOUNT: &str = "courses";

/// Default traversal deadline in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".DS_Store".to_string(),
        "Thumbs.db".to_string(),
        "desktop.ini".to_string(),
    ]
}

/// Traversal options for building a catalog
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// First URL segment of every lecture URL
    pub mount: String,

    /// Abort the traversal after this long (`None` = no deadline)
    pub timeout: Option<Duration>,

    /// Compiled glob patterns matched against bare entry names
    ignore: Vec<Pattern>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(
            DEFAULT_MOUNT,
            Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            &default_ignore_patterns(),
        )
    }
}

impl ScanOptions {
    /// Build options, dropping (and logging) ignore patterns that fail to compile
    pub fn new(mount: impl Into<String>, timeout: Option<Duration>, ignore_patterns: &[String]) -> Self {
        let ignore = ignore_patterns
            .iter()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("Ignoring invalid ignore pattern '{}': {}", raw, e);
                    None
                }
            })
            .collect();

        Self {
            mount: mount.into(),
            timeout,
            ignore,
        }
    }

    /// The built-in ignore list
    pub fn default_ignore_patterns() -> Vec<String> {
        default_ignore_patterns()
    }

    /// Replace the deadline
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check whether an entry name matches any ignore pattern
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.matches(name))
    }

    /// Source strings of the active ignore patterns
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.ignore.iter().map(|p| p.as_str().to_string()).collect()
    }
}

/// Level of the tree a skipped entry belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanLevel {
    Course,
    Chapter,
    Lecture,
}

/// A subtree skipped during traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Which level was skipped
    pub level: ScanLevel,

    /// Path of the skipped entry
    pub path: PathBuf,

    /// Why it was skipped
    pub reason: String,
}

impl ScanWarning {
    pub fn new(level: ScanLevel, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        let warning = Self {
            level,
            path: path.into(),
            reason: reason.to_string(),
        };
        tracing::warn!(
            "Skipping {:?} {}: {}",
            warning.level,
            warning.path.display(),
            warning.reason
        );
        warning
    }
}
