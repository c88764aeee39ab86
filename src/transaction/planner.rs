// src/transaction/planner.rs

//! Install plan construction
//!
//! The plan fixes the order in which split APKs are handed to the platform
//! installer and carries the scratch directory the container was extracted
//! into, so the directory lives exactly as long as the plan needs it.

use crate::error::{Error, Result};
use crate::packages::{AuxiliaryFile, ContainerKind, PackageManifest};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name token identifying the base APK of a split install
pub const BASE_UNIT_TOKEN: &str = "base";

/// Everything needed to place expansion files and install a package
#[derive(Debug)]
pub struct InstallPlan {
    pub kind: ContainerKind,
    pub manifest: Option<PackageManifest>,
    /// Never empty; the base APK (if any) is first
    pub units: Vec<PathBuf>,
    pub auxiliaries: Vec<AuxiliaryFile>,
    /// Expansion files found but not placeable
    pub dropped: Vec<PathBuf>,
    working_dir: Option<TempDir>,
}

impl InstallPlan {
    /// Application id from the manifest, if any
    pub fn package_identifier(&self) -> Option<&str> {
        self.manifest
            .as_ref()
            .and_then(|m| m.package_identifier.as_deref())
    }

    /// Version name from the manifest, if any
    pub fn version_label(&self) -> Option<&str> {
        self.manifest.as_ref().and_then(|m| m.version_label.as_deref())
    }

    /// Path of the extraction directory, if extraction happened
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_ref().map(TempDir::path)
    }

    /// Delete the extraction directory now, reporting failure
    ///
    /// Dropping the plan also deletes it, silently. Calling this twice is a
    /// no-op the second time.
    pub fn close(&mut self) -> io::Result<()> {
        match self.working_dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

fn is_base_unit(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().contains(BASE_UNIT_TOKEN))
}

/// Hoist base APKs to the front, keeping the rest in their given order
pub fn order_units(units: &mut [PathBuf]) {
    // sort_by_key is stable
    units.sort_by_key(|u| !is_base_unit(u));
}

/// Assemble an install plan
///
/// Fails with [`Error::NoInstallableUnits`] if `units` is empty.
pub fn build_plan(
    kind: ContainerKind,
    manifest: Option<PackageManifest>,
    mut units: Vec<PathBuf>,
    auxiliaries: Vec<AuxiliaryFile>,
    dropped: Vec<PathBuf>,
    working_dir: Option<TempDir>,
) -> Result<InstallPlan> {
    if units.is_empty() {
        let location = working_dir
            .as_ref()
            .map(|d| d.path().to_path_buf())
            .unwrap_or_default();
        return Err(Error::NoInstallableUnits(location));
    }

    order_units(&mut units);

    Ok(InstallPlan {
        kind,
        manifest,
        units,
        auxiliaries,
        dropped,
        working_dir,
    })
}
