// src/packages/registry.rs

//! Container format detection
//!
//! Detection is purely by file name suffix; the file is never opened.

use crate::error::{Error, Result};
use std::path::Path;

/// Split-archive suffixes (APKS from bundletool, APKM from APKMirror)
const SPLIT_ARCHIVE_SUFFIXES: &[&str] = &[".apks", ".apkm"];
const MANIFEST_ARCHIVE_SUFFIX: &str = ".xapk";
const SINGLE_UNIT_SUFFIX: &str = ".apk";

/// Kinds of package container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A plain `.apk`
    SingleUnit,
    /// An `.xapk` zip with `manifest.json` and optional OBB files
    ManifestArchive,
    /// An `.apks`/`.apkm` zip of split APKs
    SplitArchive,
}

impl ContainerKind {
    /// Get a human-readable name for the kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleUnit => "apk",
            Self::ManifestArchive => "xapk",
            Self::SplitArchive => "apks",
        }
    }

    /// Whether the container must be unpacked before classification
    pub fn requires_extraction(&self) -> bool {
        !matches!(self, Self::SingleUnit)
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify a file name into a container kind
///
/// Only the final path component is considered, case-insensitively.
///
/// # Examples
///
/// ```
/// use splitinstall::packages::{detect_format, ContainerKind};
///
/// assert_eq!(detect_format("Game.XAPK").unwrap(), ContainerKind::ManifestArchive);
/// assert_eq!(detect_format("app.apkm").unwrap(), ContainerKind::SplitArchive);
/// assert!(detect_format("app.zip").is_err());
/// ```
pub fn detect_format(name: impl AsRef<Path>) -> Result<ContainerKind> {
    let name = name.as_ref();
    let file_name = name
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name.ends_with(MANIFEST_ARCHIVE_SUFFIX) {
        Ok(ContainerKind::ManifestArchive)
    } else if SPLIT_ARCHIVE_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
        Ok(ContainerKind::SplitArchive)
    } else if file_name.ends_with(SINGLE_UNIT_SUFFIX) {
        Ok(ContainerKind::SingleUnit)
    } else {
        Err(Error::UnsupportedFormat(name.display().to_string()))
    }
}
