//! Configuration for lectern.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI on top of the resolved config)
//! 2. Environment variables (LECTERN_CONTENT_ROOT, LECTERN_HOST, LECTERN_PORT
//!    or PORT, LECTERN_SCAN_TIMEOUT)
//! 3. Config file (.lectern/config.yaml, then <config_dir>/lectern/config.yaml)
//! 4. Defaults (./courses, 0.0.0.0:5000)
//!
//! Config file discovery:
//! - Searches current directory and parents for .lectern/config.yaml
//! - Paths in the config file are relative to the directory holding .lectern/
//!
//! The resolved value is passed explicitly to the server and the catalog
//! builder; nothing here is cached globally.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::library::paths::validate_mount;
use crate::library::scan::{ScanOptions, DEFAULT_MOUNT, DEFAULT_TIMEOUT_SECONDS};

/// Directory name searched for in the current directory and its parents
pub const CONFIG_DIR_NAME: &str = ".lectern";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub scan: Option<ScanConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Content root (relative to the directory holding .lectern/)
    pub content_root: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub mount: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub ignore_patterns: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Directory holding the course tree
    pub content_root: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Traversal settings
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// First URL segment for lecture files
    pub mount: String,
    /// Traversal deadline; 0 disables it
    pub timeout_seconds: u64,
    pub ignore_patterns: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            ignore_patterns: ScanOptions::default_ignore_patterns(),
        }
    }
}

impl ResolvedConfig {
    /// Configuration with defaults for a given content root
    pub fn with_root(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            config_file: None,
            server: ServerSettings::default(),
            scan: ScanSettings::default(),
        }
    }

    /// Compile the scan settings into traversal options
    pub fn scan_options(&self) -> ScanOptions {
        let timeout = match self.scan.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        ScanOptions::new(self.scan.mount.clone(), timeout, &self.scan.ignore_patterns)
    }

    /// Socket address to bind, e.g. `0.0.0.0:5000`
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Per-user config file (`<config_dir>/lectern/config.yaml`), if present
fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("lectern").join(CONFIG_FILE_NAME);
    path.exists().then_some(path)
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Directory that relative config paths are resolved against
fn config_base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    match parent.file_name() {
        Some(name) if name == CONFIG_DIR_NAME => parent.parent().unwrap_or(parent).to_path_buf(),
        _ => parent.to_path_buf(),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", key, value, e))
}

/// Load configuration from the process environment and discovered files
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd).or_else(user_config_file);

    load_config_with(config_file.as_deref(), &cwd, |key| std::env::var(key).ok())
}

/// Resolve configuration from an optional config file, a working directory
/// for defaults, and an environment lookup
pub fn load_config_with(
    config_file: Option<&Path>,
    cwd: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::with_root(cwd.join("courses"));

    if let Some(config_path) = config_file {
        let config = load_config_file(config_path)?;
        let base_dir = config_base_dir(config_path);

        if let Some(ref root) = config.paths.content_root {
            resolved.content_root = resolve_path(&base_dir, root);
        }

        if let Some(server) = config.server {
            if let Some(host) = server.host {
                resolved.server.host = host;
            }
            if let Some(port) = server.port {
                resolved.server.port = port;
            }
        }

        if let Some(scan) = config.scan {
            if let Some(mount) = scan.mount {
                resolved.scan.mount = mount;
            }
            if let Some(timeout) = scan.timeout_seconds {
                resolved.scan.timeout_seconds = timeout;
            }
            if let Some(patterns) = scan.ignore_patterns {
                resolved.scan.ignore_patterns = patterns;
            }
        }

        resolved.config_file = Some(config_path.to_path_buf());
    }

    if let Some(root) = env("LECTERN_CONTENT_ROOT") {
        resolved.content_root = resolve_path(cwd, &root);
    }
    if let Some(host) = env("LECTERN_HOST") {
        resolved.server.host = host;
    }
    if let Some(port) = env("LECTERN_PORT").or_else(|| env("PORT")) {
        resolved.server.port = parse_env("LECTERN_PORT", port)?;
    }
    if let Some(timeout) = env("LECTERN_SCAN_TIMEOUT") {
        resolved.scan.timeout_seconds = parse_env("LECTERN_SCAN_TIMEOUT", timeout)?;
    }

    validate_mount(&resolved.scan.mount).map_err(|e| {
        anyhow::anyhow!(
            "Invalid scan.mount '{}': {} (use a single URL-safe segment such as 'courses')",
            resolved.scan.mount,
            e
        )
    })?;

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_without_file() {
        let cwd = PathBuf::from("/srv/app");
        let config = load_config_with(None, &cwd, no_env).unwrap();

        assert_eq!(config.content_root, PathBuf::from("/srv/app/courses"));
        assert_eq!(config.address(), "0.0.0.0:5000");
        assert_eq!(config.scan, ScanSettings::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let lectern_dir = temp.path().join(".lectern");
        std::fs::create_dir_all(&lectern_dir).unwrap();

        let config_path = lectern_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  content_root: ./media
server:
  host: 127.0.0.1
  port: 8080
scan:
  mount: files
  timeout_seconds: 5
  ignore_patterns: ["*.part"]
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.paths.content_root, Some("./media".to_string()));

        let config = load_config_with(Some(config_path.as_path()), Path::new("/elsewhere"), no_env).unwrap();
        assert_eq!(config.content_root, temp.path().join("./media"));
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.scan.mount, "files");
        assert_eq!(config.scan.timeout_seconds, 5);
        assert_eq!(config.scan.ignore_patterns, vec!["*.part".to_string()]);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("LECTERN_CONTENT_ROOT", "/data/courses"),
            ("PORT", "7000"),
            ("LECTERN_SCAN_TIMEOUT", "0"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with(None, Path::new("/srv"), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.content_root, PathBuf::from("/data/courses"));
        assert_eq!(config.server.port, 7000);
        assert!(config.scan_options().timeout.is_none());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = load_config_with(None, Path::new("/srv"), |k| {
            (k == "LECTERN_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unservable_mount_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");

        for mount in ["media files", "static/courses", "''"] {
            std::fs::write(
                &config_path,
                format!("version: \"1.0\"\nscan:\n  mount: {mount}\n"),
            )
            .unwrap();

            let result = load_config_with(Some(config_path.as_path()), temp.path(), no_env);
            assert!(result.is_err(), "{mount}");
        }
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().unwrap();
        let lectern_dir = temp.path().join(".lectern");
        std::fs::create_dir_all(&lectern_dir).unwrap();
        std::fs::write(lectern_dir.join("config.yaml"), "version: \"1.0\"\n").unwrap();

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_config_file(&nested),
            Some(lectern_dir.join("config.yaml"))
        );
    }

    #[test]
    fn test_config_base_dir() {
        assert_eq!(
            config_base_dir(Path::new("/home/user/project/.lectern/config.yaml")),
            PathBuf::from("/home/user/project")
        );
        assert_eq!(
            config_base_dir(Path::new("/home/user/.config/lectern/config.yaml")),
            PathBuf::from("/home/user/.config/lectern")
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
