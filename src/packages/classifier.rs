// src/packages/classifier.rs

//! Member classification for extracted containers
//!
//! Walks an extracted container and sorts its entries into installable APKs
//! and OBB expansion files. Each OBB file gets a destination under the data
//! root, namespaced by a package name:
//!
//! ```text
//! extract_dir/
//!   base.apk                          -> unit
//!   config.arm64_v8a.apk              -> unit
//!   main.1.com.example.game.obb       -> {data_root}/{manifest package}/main.1...obb
//!   Android/obb/com.example.game/     (XAPK only)
//!     patch.1.com.example.game.obb    -> {data_root}/com.example.game/patch.1...obb
//! ```
//!
//! Root-level OBB files need a manifest package name; without one they are
//! dropped, since there is nowhere to put them. Each destination is claimed
//! by the first file mapped to it; later files for the same destination are
//! dropped, so no two copies ever target one path. Split archives never
//! yield expansion files.

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_filename;
use crate::filesystem::{DirEntry, FileSystem};
use crate::packages::manifest::PackageManifest;
use crate::packages::registry::ContainerKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const UNIT_SUFFIX: &str = ".apk";
pub const DATA_SUFFIX: &str = ".obb";

/// Conventional location of expansion files inside an XAPK
pub const NESTED_DATA_DIR: &str = "Android/obb";

/// An expansion file and where it must be copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Result of classifying an extracted container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// APKs in enumeration order
    pub units: Vec<PathBuf>,
    pub auxiliaries: Vec<AuxiliaryFile>,
    /// Expansion files found but not placeable
    pub dropped: Vec<PathBuf>,
}

impl Classification {
    /// Number of expansion files seen, placeable or not
    pub fn auxiliaries_discovered(&self) -> usize {
        self.auxiliaries.len() + self.dropped.len()
    }

    fn push_auxiliary(&mut self, source: PathBuf, destination: PathBuf) {
        if self.auxiliaries.iter().any(|aux| aux.destination == destination) {
            warn!(
                "Skipping {}: {} is already taken by another expansion file",
                source.display(),
                destination.display()
            );
            self.dropped.push(source);
            return;
        }
        self.auxiliaries.push(AuxiliaryFile {
            source,
            destination,
        });
    }
}

fn has_suffix(name: &str, suffix: &str) -> bool {
    name.to_ascii_lowercase().ends_with(suffix)
}

fn is_unit(entry: &DirEntry) -> bool {
    !entry.is_dir && has_suffix(&entry.name, UNIT_SUFFIX)
}

fn is_data(entry: &DirEntry) -> bool {
    !entry.is_dir && has_suffix(&entry.name, DATA_SUFFIX)
}

/// Compute `{data_root}/{namespace}/{file_name}`, or `None` if the
/// namespace is not a usable directory name
fn destination_for(data_root: &Path, namespace: &str, file_name: &str) -> Option<PathBuf> {
    match sanitize_filename(namespace) {
        Ok(namespace) => Some(data_root.join(namespace).join(file_name)),
        Err(e) => {
            warn!("Unusable package namespace {:?}: {}", namespace, e);
            None
        }
    }
}

/// Classify the entries of an extracted container
pub fn classify(
    fs: &dyn FileSystem,
    kind: ContainerKind,
    extracted_dir: &Path,
    manifest: Option<&PackageManifest>,
    data_root: &Path,
) -> Result<Classification> {
    let mut result = Classification::default();
    let namespace = manifest.and_then(|m| m.package_identifier.as_deref());

    for entry in fs.read_dir(extracted_dir)? {
        if is_unit(&entry) {
            debug!("Unit: {}", entry.name);
            result.units.push(entry.path);
        } else if kind == ContainerKind::ManifestArchive && is_data(&entry) {
            match namespace.and_then(|ns| destination_for(data_root, ns, &entry.name)) {
                Some(destination) => result.push_auxiliary(entry.path, destination),
                None => {
                    warn!(
                        "Skipping {}: no package name to place it under",
                        entry.name
                    );
                    result.dropped.push(entry.path);
                }
            }
        }
    }

    if kind == ContainerKind::ManifestArchive {
        collect_nested_data(fs, extracted_dir, data_root, &mut result)?;
    }

    if result.units.is_empty() {
        return Err(Error::NoInstallableUnits(extracted_dir.to_path_buf()));
    }

    debug!(
        "Classified {} unit(s), {} expansion file(s), {} dropped",
        result.units.len(),
        result.auxiliaries.len(),
        result.dropped.len()
    );
    Ok(result)
}

/// Collect `Android/obb/<package>/*.obb`, namespaced by `<package>`
fn collect_nested_data(
    fs: &dyn FileSystem,
    extracted_dir: &Path,
    data_root: &Path,
    result: &mut Classification,
) -> Result<()> {
    let nested = extracted_dir.join(NESTED_DATA_DIR);
    if !fs.exists(&nested) {
        return Ok(());
    }

    for package_dir in fs.read_dir(&nested)?.into_iter().filter(|e| e.is_dir) {
        for entry in fs.read_dir(&package_dir.path)?.into_iter().filter(is_data) {
            match destination_for(data_root, &package_dir.name, &entry.name) {
                Some(destination) => result.push_auxiliary(entry.path, destination),
                None => result.dropped.push(entry.path),
            }
        }
    }

    Ok(())
}
