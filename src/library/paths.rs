//! URL construction and path containment for course content.
//!
//! Every URL segment is encoded independently, with the same reserved set
//! as JavaScript's `encodeURIComponent`, so course, chapter and file names
//! containing spaces, `&`, `/`-lookalikes or non-ASCII text survive a
//! round trip through the browser.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Characters left unescaped by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors for user-supplied path segments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path segment is empty")]
    Empty,

    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),

    #[error("Path segment is not valid UTF-8 after decoding: {0}")]
    InvalidEncoding(String),

    #[error("Path escapes the content root: {0}")]
    Traversal(String),
}

/// Percent-encode a single URL segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, COMPONENT).to_string()
}

/// Percent-decode a single URL segment
pub fn decode_segment(segment: &str) -> Result<Cow<'_, str>, PathError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding(segment.to_string()))
}

/// Build the fetch URL for a lecture: `/<mount>/<course>/<chapter>/<file>`
pub fn lecture_url(mount: &str, course: &str, chapter: &str, file: &str) -> String {
    format!(
        "/{}/{}/{}/{}",
        encode_segment(mount),
        encode_segment(course),
        encode_segment(chapter),
        encode_segment(file)
    )
}

/// Check that a decoded name is usable as exactly one path component
pub fn validate_segment(segment: &str) -> Result<&str, PathError> {
    if segment.is_empty() {
        return Err(PathError::Empty);
    }

    if segment == "." || segment == ".." {
        return Err(PathError::Traversal(segment.to_string()));
    }

    if segment.contains(['/', '\\', '\0']) {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }

    Ok(segment)
}

/// Check that a URL mount is a single segment that needs no escaping, so
/// the route the server registers matches the URLs the catalog emits
pub fn validate_mount(mount: &str) -> Result<&str, PathError> {
    let mount = validate_segment(mount)?;
    if encode_segment(mount) != mount {
        return Err(PathError::InvalidSegment(mount.to_string()));
    }
    Ok(mount)
}

/// Join validated segments onto the root without touching the filesystem
pub fn join_segments(root: &Path, segments: &[&str]) -> Result<PathBuf, PathError> {
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(validate_segment(segment)?);
    }
    Ok(path)
}

/// Resolve segments under `root` and require the canonical result to stay
/// inside the canonical root.
///
/// Returns `Ok(None)` when the target (or the root itself) does not exist.
/// Symlinks pointing outside the root are reported as traversal.
pub async fn resolve_within(root: &Path, segments: &[&str]) -> Result<Option<PathBuf>, PathError> {
    let joined = join_segments(root, segments)?;

    let canonical_root = match tokio::fs::canonicalize(root).await {
        Ok(path) => path,
        Err(_) => return Ok(None),
    };

    let resolved = match tokio::fs::canonicalize(&joined).await {
        Ok(path) => path,
        Err(_) => return Ok(None),
    };

    if !resolved.starts_with(&canonical_root) {
        return Err(PathError::Traversal(joined.display().to_string()));
    }

    Ok(Some(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_encode_uri_component() {
        assert_eq!(encode_segment("Intro to Marketing"), "Intro%20to%20Marketing");
        assert_eq!(encode_segment("Q&A"), "Q%26A");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("it's (ok)!"), "it's%20(ok)!");
        assert_eq!(encode_segment("café"), "caf%C3%A9");
        assert_eq!(encode_segment("file-1_v2.mp4"), "file-1_v2.mp4");
        assert_eq!(encode_segment("100%"), "100%25");
    }

    #[test]
    fn test_validate_mount() {
        assert_eq!(validate_mount("courses"), Ok("courses"));
        assert_eq!(validate_mount("media-v2"), Ok("media-v2"));
        assert_eq!(validate_mount(""), Err(PathError::Empty));
        assert!(validate_mount("..").is_err());
        assert!(validate_mount("static/courses").is_err());
        assert!(validate_mount("media files").is_err());
        assert!(validate_mount("cours%C3%A9").is_err());
        assert!(validate_mount("cours\u{e9}").is_err());
    }

    #[test]
    fn test_lecture_url() {
        let url = lecture_url("courses", "Intro to Marketing", "Chapter 1 - Basics", "lesson1.mp4");
        assert_eq!(
            url,
            "/courses/Intro%20to%20Marketing/Chapter%201%20-%20Basics/lesson1.mp4"
        );
    }

    #[test]
    fn test_url_segments_round_trip() {
        let names = ["Intro to Marketing", "Q&A session", "Économie 101", "日本語", "50% off"];
        for name in names {
            let url = lecture_url("courses", name, name, name);
            let segments: Vec<_> = url.trim_start_matches('/').split('/').collect();
            assert_eq!(segments.len(), 4);
            for segment in &segments[1..] {
                assert_eq!(decode_segment(segment).unwrap(), name);
            }
        }
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(
            decode_segment("%FF%FE"),
            Err(PathError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("Chapter 1").is_ok());
        assert!(validate_segment("..hidden").is_ok());
        assert_eq!(validate_segment(""), Err(PathError::Empty));
        assert!(matches!(validate_segment(".."), Err(PathError::Traversal(_))));
        assert!(matches!(validate_segment("."), Err(PathError::Traversal(_))));
        assert!(matches!(validate_segment("a/b"), Err(PathError::InvalidSegment(_))));
        assert!(matches!(validate_segment("a\\b"), Err(PathError::InvalidSegment(_))));
        assert!(matches!(validate_segment("a\0b"), Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn test_join_segments() {
        let root = Path::new("/srv/courses");
        assert_eq!(
            join_segments(root, &["A", "B", "c.pdf"]).unwrap(),
            PathBuf::from("/srv/courses/A/B/c.pdf")
        );
        assert!(join_segments(root, &["A", "..", "etc"]).is_err());
        assert!(join_segments(root, &["/etc/passwd"]).is_err());
    }

    #[tokio::test]
    async fn test_resolve_within() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("courses");
        tokio::fs::create_dir_all(root.join("A").join("B")).await.unwrap();
        tokio::fs::write(root.join("A").join("B").join("c.pdf"), b"pdf").await.unwrap();
        tokio::fs::write(temp.path().join("secret.txt"), b"secret").await.unwrap();

        let found = resolve_within(&root, &["A", "B", "c.pdf"]).await.unwrap();
        assert!(found.unwrap().ends_with("A/B/c.pdf"));

        let missing = resolve_within(&root, &["A", "B", "missing.pdf"]).await.unwrap();
        assert!(missing.is_none());

        assert!(resolve_within(&root, &["..", "secret.txt"]).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_within_rejects_escaping_symlink() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("courses");
        tokio::fs::create_dir_all(root.join("A").join("B")).await.unwrap();
        tokio::fs::write(temp.path().join("secret.txt"), b"secret").await.unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("secret.txt"),
            root.join("A").join("B").join("link.pdf"),
        )
        .unwrap();

        let result = resolve_within(&root, &["A", "B", "link.pdf"]).await;
        assert!(matches!(result, Err(PathError::Traversal(_))));
    }
}
