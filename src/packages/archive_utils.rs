// src/packages/archive_utils.rs

//! Container extraction
//!
//! XAPK, APKS and APKM containers are zip archives. Extraction is
//! all-or-nothing from the caller's point of view: any entry failure fails
//! the whole call, and whatever was already written is left in the
//! destination for the caller to delete.

use crate::error::{Error, Result};
use crate::filesystem::path::{safe_join, sanitize_path};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Unpack `archive_path` into the empty directory `destination`
///
/// Returns the number of files written.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<usize> {
    let mut entries = fs::read_dir(destination)
        .map_err(|e| Error::extraction(destination, format!("destination unusable: {}", e)))?;
    if entries.next().is_some() {
        return Err(Error::extraction(destination, "destination is not empty"));
    }

    let file = File::open(archive_path).map_err(|e| Error::extraction(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| Error::extraction(archive_path, e))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::extraction(archive_path, e))?;

        let relative = sanitize_path(entry.name()).map_err(|e| {
            Error::extraction(archive_path, format!("entry {}: {}", entry.name(), e))
        })?;
        let target = safe_join(destination, &relative)
            .map_err(|e| Error::extraction(archive_path, e))?;

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::extraction(archive_path, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::extraction(archive_path, e))?;
        }

        let mut out = File::create(&target).map_err(|e| Error::extraction(archive_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            Error::extraction(archive_path, format!("writing {}: {}", relative.display(), e))
        })?;
        debug!("Extracted {}", relative.display());
        written += 1;
    }

    Ok(written)
}
