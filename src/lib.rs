//! lectern - Filesystem-backed course catalog and media server
//!
//! Walks a content directory shaped like `root/<course>/<chapter>/<file>`
//! and serves it as JSON, together with the media files themselves.
//!
//! # Architecture
//!
//! The directory tree is the database:
//! - A course is a directory under the content root; its name is its ID
//! - A chapter is a directory under a course
//! - A lecture is a file under a chapter, classified by extension
//! - An optional `metadata.json` per course carries hand-entered fields
//!
//! The catalog is rebuilt from disk on every request.
//!
//! # Modules
//!
//! - `library`: Catalog builder, media classification, URLs, metadata
//! - `server`: axum HTTP surface
//! - `config`: Config file / env / default resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve ./courses on port 5000
//! lectern serve
//!
//! # Dump the catalog
//! lectern --root /srv/courses catalog --pretty
//! ```

pub mod cli;
pub mod config;
pub mod library;
pub mod server;

// Re-export main types at crate root for convenience
pub use config::ResolvedConfig;
pub use library::{Catalog, Chapter, Course, Lecture, MediaType, ScanOptions};
