//! Course content library backed by a plain directory tree.
//!
//! # Storage Layout
//!
//! ```text
//! <content_root>/
//! └── <course>/                 # directory name = course ID
//!     ├── metadata.json         # optional: title, description, category...
//!     └── <chapter>/
//!         ├── lesson1.mp4       # video
//!         ├── notes.pdf         # pdf
//!         └── intro.mp3         # audio
//! ```
//!
//! Lecture URLs take the form `/<mount>/<course>/<chapter>/<file>` with
//! every segment percent-encoded on its own.

pub mod catalog;
pub mod manage;
pub mod media;
pub mod metadata;
pub mod paths;
pub mod scan;

pub use catalog::{Catalog, CatalogError, Chapter, Course, Lecture};
pub use manage::{create_chapter, create_course, update_course, CourseError, CourseUpdate, NewCourse};
pub use media::MediaType;
pub use metadata::{CourseMetadata, METADATA_FILE};
pub use paths::PathError;
pub use scan::{ScanLevel, ScanOptions, ScanWarning};
