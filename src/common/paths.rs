//! Manifest reference resolution and configuration paths
//!
//! Every file a manifest mentions is relative to the directory holding the
//! manifest. [`PathResolver`] turns such a reference into an absolute path
//! and confirms the file is there.

use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Name used for the configuration directory
const APP_NAME: &str = "postman-executor";

/// Resolves manifest references against a base directory
pub trait PathResolver {
    /// Join `raw` onto `base_dir` and confirm the result is an existing file
    ///
    /// Fails with [`Error::InvalidPath`] when `raw` cannot be used as a path
    /// and with [`Error::FileNotFound`] when nothing is there.
    fn resolve(&self, base_dir: &Path, raw: &str) -> Result<PathBuf>;
}

/// Resolver backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl PathResolver for FsResolver {
    fn resolve(&self, base_dir: &Path, raw: &str) -> Result<PathBuf> {
        let path = join_reference(base_dir, raw)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::FileNotFound(path))
        }
    }
}

/// Join a raw reference onto the base directory without touching the disk
///
/// Absolute references replace the base directory, as `Path::join` does.
pub fn join_reference(base_dir: &Path, raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() || raw.contains('\0') {
        return Err(Error::InvalidPath(raw.to_string()));
    }
    let base = if base_dir.is_absolute() {
        base_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(base_dir)
    };
    Ok(base.join(raw))
}

/// Directory holding the manifest, used as the base for every reference
pub fn manifest_base_dir(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/postman-executor/`
/// - macOS: `~/Library/Application Support/postman-executor/`
/// - Windows: `%APPDATA%\postman-executor\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
