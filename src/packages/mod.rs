// src/packages/mod.rs

//! Package container support
//!
//! Detection, extraction, manifest reading and member classification for
//! APK, XAPK, APKS and APKM files.

pub mod archive_utils;
pub mod classifier;
pub mod manifest;
pub mod registry;

pub use archive_utils::extract_archive;
pub use classifier::{classify, AuxiliaryFile, Classification};
pub use manifest::{read_manifest, PackageManifest};
pub use registry::{detect_format, ContainerKind};
