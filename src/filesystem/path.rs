// src/filesystem/path.rs

//! Path sanitization for names taken from package contents
//!
//! Archive entry names and manifest package names come from untrusted
//! containers. Anything that would resolve outside the directory it is
//! joined onto is rejected.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize an archive entry name into a relative path
///
/// `.` components are dropped, leading slashes are stripped, and `..`
/// components are rejected outright.
///
/// # Examples
///
/// ```
/// use splitinstall::filesystem::path::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_path("Android/obb/main.obb").unwrap(), PathBuf::from("Android/obb/main.obb"));
/// assert_eq!(sanitize_path("/base.apk").unwrap(), PathBuf::from("base.apk"));
/// assert!(sanitize_path("../base.apk").is_err());
/// ```
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();
    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath("Empty path after sanitization".to_string()));
    }

    Ok(normalized)
}

/// Join an untrusted relative path onto `root`
///
/// # Examples
///
/// ```
/// use splitinstall::filesystem::path::safe_join;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/cache/extract_1");
/// assert_eq!(
///     safe_join(root, "config.arm64_v8a.apk").unwrap(),
///     PathBuf::from("/cache/extract_1/config.arm64_v8a.apk")
/// );
/// assert!(safe_join(root, "../../etc/passwd").is_err());
/// ```
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let joined = root.join(sanitize_path(path.as_ref())?);

    // Catches symlinked parents once the target exists
    if let (Ok(canonical_root), Ok(canonical_joined)) =
        (root.canonicalize(), joined.canonicalize())
        && !canonical_joined.starts_with(&canonical_root)
    {
        return Err(Error::PathTraversal(format!(
            "Path {} escapes root {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}

/// Validate a single path component such as a package name
///
/// # Examples
///
/// ```
/// use splitinstall::filesystem::path::sanitize_filename;
///
/// assert_eq!(sanitize_filename("com.example.game").unwrap(), "com.example.game");
/// assert!(sanitize_filename("../com.example.game").is_err());
/// assert!(sanitize_filename("com/example").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains('/') || name.contains('\\') {
        return Err(Error::PathTraversal(format!(
            "Filename contains path separator: {}",
            name
        )));
    }

    if name == ".." || name == "." {
        return Err(Error::PathTraversal(format!("Invalid filename: {}", name)));
    }

    if name.is_empty() {
        return Err(Error::InvalidPath("Empty filename".to_string()));
    }

    Ok(name.to_string())
}
