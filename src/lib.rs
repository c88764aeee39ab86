// src/lib.rs

//! splitinstall
//!
//! Installs Android packages delivered as a single APK or bundled in an
//! XAPK, APKS or APKM container.
//!
//! # Architecture
//!
//! - `packages`: format detection, extraction, manifest reading and member
//!   classification
//! - `transaction`: install planning and the [`InstallPipeline`] state machine
//! - `platform`: permission, source and installer collaborators, with
//!   `adb`-backed implementations for host use
//! - `filesystem`: filesystem primitives and path sanitization
//!
//! Extraction always happens in a private working directory that is removed
//! when the request ends, whether it succeeded or not.

pub mod config;
mod error;
pub mod filesystem;
pub mod packages;
pub mod platform;
pub mod progress;
pub mod transaction;

pub use config::{AdbConfig, ConfigError, InstallerConfig};
pub use error::{Error, ErrorKind, Result};
pub use packages::{ContainerKind, PackageManifest, detect_format};
pub use platform::{
    AdbInstaller, CacheSourceAcquirer, Capability, HostPermissions, InstallRejection,
    PermissionProvider, PlatformInstaller, RejectionStatus, SourceAcquirer, SourceRef,
};
pub use progress::{
    CallbackProgress, InstallPhase, LogProgress, ProgressEvent, ProgressTracker, SilentProgress,
};
pub use transaction::{
    Collaborators, InstallOutcome, InstallPipeline, InstallPlan, InstallReport, InstallState,
    PlacementFailure,
};
