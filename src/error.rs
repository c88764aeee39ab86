// src/error.rs

//! Error types for splitinstall
//!
//! Every failure the install pipeline can report maps onto one variant here.
//! `Error::kind()` gives a fieldless tag for matching outcomes without
//! inspecting messages.

use crate::config::ConfigError;
use crate::platform::{Capability, InstallRejection};
use crate::transaction::PlacementFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by package parsing and the install pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// File name does not end in a recognized container suffix
    #[error("Unsupported package format: {0} (expected .apk, .xapk, .apks or .apkm)")]
    UnsupportedFormat(String),

    /// Archive could not be unpacked
    #[error("Failed to extract {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// manifest.json exists but is not valid JSON
    #[error("Package manifest {} is corrupt: {source}", path.display())]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Container holds no installable APK
    #[error("No installable APK files found in {}", .0.display())]
    NoInstallableUnits(PathBuf),

    /// Source could not be read or copied into the cache
    #[error("Cannot read package source {reference}: {reason}")]
    SourceUnreadable { reference: String, reason: String },

    /// A required capability has not been granted
    #[error("Permission denied: {0} permission has not been granted")]
    PermissionDenied(Capability),

    /// The platform installer refused the package
    #[error("Installation rejected by the system: {0}")]
    PlatformInstallRejected(InstallRejection),

    /// Some expansion files could not be copied (informational)
    #[error("{} expansion file(s) could not be placed", .0.len())]
    AuxiliaryPlacementPartialFailure(Vec<PlacementFailure>),

    /// Archive entry would escape its extraction directory
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless classification of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionError,
    ManifestCorrupt,
    NoInstallableUnitsFound,
    SourceUnreadable,
    PermissionDenied,
    PlatformInstallRejected,
    AuxiliaryPlacementPartialFailure,
    InvalidPath,
    Config,
    Io,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Extraction { .. } => ErrorKind::ExtractionError,
            Self::ManifestCorrupt { .. } => ErrorKind::ManifestCorrupt,
            Self::NoInstallableUnits(_) => ErrorKind::NoInstallableUnitsFound,
            Self::SourceUnreadable { .. } => ErrorKind::SourceUnreadable,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::PlatformInstallRejected(_) => ErrorKind::PlatformInstallRejected,
            Self::AuxiliaryPlacementPartialFailure(_) => {
                ErrorKind::AuxiliaryPlacementPartialFailure
            }
            Self::PathTraversal(_) | Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Build an extraction error from any displayable cause
    pub fn extraction(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a source error from any displayable cause
    pub fn source_unreadable(reference: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnreadable {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnsupportedFormat => "unsupported-format",
            Self::ExtractionError => "extraction-error",
            Self::ManifestCorrupt => "manifest-corrupt",
            Self::NoInstallableUnitsFound => "no-installable-units",
            Self::SourceUnreadable => "source-unreadable",
            Self::PermissionDenied => "permission-denied",
            Self::PlatformInstallRejected => "install-rejected",
            Self::AuxiliaryPlacementPartialFailure => "placement-partial-failure",
            Self::InvalidPath => "invalid-path",
            Self::Config => "config",
            Self::Io => "io",
        };
        write!(f, "{}", name)
    }
}
