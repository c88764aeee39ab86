// src/platform/mod.rs

//! Platform collaborators
//!
//! The install pipeline depends on three outside services: the permission
//! subsystem, whatever hands it the package file, and the system package
//! installer. Each is a trait here so the pipeline can be driven against
//! real tooling (`adb`) or against fakes in tests.

mod adb;
mod source;

pub use adb::{AdbInstaller, HostPermissions};
pub use source::CacheSourceAcquirer;

use crate::error::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A permission the pipeline needs before touching any file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read/write access to arbitrary storage locations
    Storage,
    /// Permission to trigger package installation
    Install,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage => write!(f, "storage"),
            Self::Install => write!(f, "install"),
        }
    }
}

/// Permission queries and prompts
///
/// Requests only open the relevant system settings; the grant happens out
/// of process, so they return immediately and callers re-query later.
pub trait PermissionProvider: Send + Sync {
    fn has_broad_storage_access(&self) -> bool;
    fn has_install_capability(&self) -> bool;
    fn request_broad_storage_access(&self);
    fn request_install_capability(&self);

    fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Storage => self.has_broad_storage_access(),
            Capability::Install => self.has_install_capability(),
        }
    }

    fn request(&self, capability: Capability) {
        match capability {
            Capability::Storage => self.request_broad_storage_access(),
            Capability::Install => self.request_install_capability(),
        }
    }
}

/// Reference to the package file the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A readable path on the local filesystem
    Path(PathBuf),
    /// An opaque, possibly transient handle (e.g. a `content://` or
    /// `file://` URI) that must be copied before use
    Handle { uri: String, display_name: String },
}

/// URI schemes accepted as source handles
pub const HANDLE_SCHEMES: &[&str] = &["file", "content"];

impl SourceRef {
    /// Interpret a command-line argument: a `file://` or `content://` URI is
    /// a handle, everything else is a path
    pub fn parse(input: &str) -> Self {
        match url::Url::parse(input) {
            Ok(url) if HANDLE_SCHEMES.contains(&url.scheme()) => {
                let display_name = url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("package")
                    .to_string();
                Self::Handle {
                    uri: input.to_string(),
                    display_name,
                }
            }
            _ => Self::Path(PathBuf::from(input)),
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Handle { uri, .. } => write!(f, "{}", uri),
        }
    }
}

/// Turns a [`SourceRef`] into a local file path
pub trait SourceAcquirer: Send + Sync {
    /// Fails with `Error::SourceUnreadable`
    fn acquire(&self, source: &SourceRef) -> Result<PathBuf>;
}

/// Platform installer result codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionStatus {
    /// The user or the system cancelled the session
    Aborted,
    /// Blocked by policy
    Blocked,
    /// Conflicts with an installed package (e.g. signature mismatch)
    Conflict,
    /// Not compatible with the device
    Incompatible,
    /// Malformed or missing APK
    Invalid,
    /// Not enough storage
    Storage,
    Failure,
}

impl RejectionStatus {
    /// Classify an installer failure code such as `INSTALL_FAILED_INSUFFICIENT_STORAGE`
    pub fn from_code(code: &str) -> Self {
        let code = code.to_ascii_uppercase();
        if code.contains("STORAGE") {
            Self::Storage
        } else if code.contains("ABORTED") || code.contains("USER_RESTRICTED") {
            Self::Aborted
        } else if code.contains("UPDATE_INCOMPATIBLE")
            || code.contains("ALREADY_EXISTS")
            || code.contains("DUPLICATE")
            || code.contains("CONFLICT")
            || code.contains("VERSION_DOWNGRADE")
        {
            Self::Conflict
        } else if code.contains("NO_MATCHING_ABIS")
            || code.contains("OLDER_SDK")
            || code.contains("NEWER_SDK")
            || code.contains("MISSING_FEATURE")
            || code.contains("MISSING_SHARED_LIBRARY")
            || code.contains("INCOMPATIBLE")
        {
            Self::Incompatible
        } else if code.contains("VERIFICATION") || code.contains("BLOCKED") {
            Self::Blocked
        } else if code.contains("PARSE_FAILED") || code.contains("INVALID") {
            Self::Invalid
        } else {
            Self::Failure
        }
    }
}

impl std::fmt::Display for RejectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aborted => "aborted",
            Self::Blocked => "blocked",
            Self::Conflict => "conflict",
            Self::Incompatible => "incompatible",
            Self::Invalid => "invalid",
            Self::Storage => "insufficient storage",
            Self::Failure => "failure",
        };
        write!(f, "{}", name)
    }
}

/// Why the platform installer refused a package
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {reason}")]
pub struct InstallRejection {
    pub status: RejectionStatus,
    /// Message reported by the installer
    pub reason: String,
}

impl InstallRejection {
    pub fn new(status: RejectionStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

/// The system package installer
///
/// There is no timeout: installation may wait on a user-facing dialog.
pub trait PlatformInstaller: Send + Sync {
    /// Install a single standalone APK
    fn install_single(&self, apk: &Path) -> std::result::Result<(), InstallRejection>;

    /// Install several split APKs in one session, in the given order
    fn install_multiple(&self, apks: &[PathBuf]) -> std::result::Result<(), InstallRejection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ref_parse() {
        assert_eq!(
            SourceRef::parse("/sdcard/Download/game.xapk"),
            SourceRef::Path(PathBuf::from("/sdcard/Download/game.xapk"))
        );
        assert_eq!(
            SourceRef::parse("game.apk"),
            SourceRef::Path(PathBuf::from("game.apk"))
        );
        assert_eq!(
            SourceRef::parse("content://downloads/public/game.xapk"),
            SourceRef::Handle {
                uri: "content://downloads/public/game.xapk".into(),
                display_name: "game.xapk".into(),
            }
        );
        assert_eq!(
            SourceRef::parse(r"C:\Users\me\app.apk"),
            SourceRef::Path(PathBuf::from(r"C:\Users\me\app.apk"))
        );
    }

    #[test]
    fn test_colon_in_relative_path_is_not_a_handle() {
        assert_eq!(
            SourceRef::parse("my:game.apk"),
            SourceRef::Path(PathBuf::from("my:game.apk"))
        );
        assert_eq!(
            SourceRef::parse("backup:2024/app.xapk"),
            SourceRef::Path(PathBuf::from("backup:2024/app.xapk"))
        );
        assert_eq!(
            SourceRef::parse("file:///sdcard/Download/app.apk"),
            SourceRef::Handle {
                uri: "file:///sdcard/Download/app.apk".into(),
                display_name: "app.apk".into(),
            }
        );
    }

    #[test]
    fn test_rejection_status_from_code() {
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_INSUFFICIENT_STORAGE"),
            RejectionStatus::Storage
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_UPDATE_INCOMPATIBLE"),
            RejectionStatus::Conflict
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_NO_MATCHING_ABIS"),
            RejectionStatus::Incompatible
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_PARSE_FAILED_NOT_APK"),
            RejectionStatus::Invalid
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_ABORTED"),
            RejectionStatus::Aborted
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_VERIFICATION_FAILURE"),
            RejectionStatus::Blocked
        );
        assert_eq!(
            RejectionStatus::from_code("INSTALL_FAILED_INTERNAL_ERROR"),
            RejectionStatus::Failure
        );
    }

    #[test]
    fn test_rejection_display() {
        let rejection = InstallRejection::new(RejectionStatus::Storage, "disk full");
        assert_eq!(rejection.to_string(), "insufficient storage: disk full");
    }
}
