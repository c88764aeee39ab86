// src/platform/source.rs

//! Source materialization into the private cache

use super::{SourceAcquirer, SourceRef};
use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_filename;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Resolves direct paths in place and copies handles into `cache_dir`
///
/// Only `file://` handles can be opened on a host; anything else is
/// reported as unreadable.
#[derive(Debug, Clone)]
pub struct CacheSourceAcquirer {
    cache_dir: PathBuf,
}

impl CacheSourceAcquirer {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn check_readable(reference: &str, path: &Path) -> Result<()> {
        let metadata = fs::metadata(path).map_err(|e| Error::source_unreadable(reference, e))?;
        if !metadata.is_file() {
            return Err(Error::source_unreadable(reference, "not a regular file"));
        }
        File::open(path).map_err(|e| Error::source_unreadable(reference, e))?;
        Ok(())
    }

    fn materialize(&self, uri: &str, display_name: &str) -> Result<PathBuf> {
        let url = Url::parse(uri).map_err(|e| Error::source_unreadable(uri, e))?;
        if url.scheme() != "file" {
            return Err(Error::source_unreadable(
                uri,
                format!("cannot open '{}' handles on this host", url.scheme()),
            ));
        }
        let origin = url
            .to_file_path()
            .map_err(|_| Error::source_unreadable(uri, "not a local file URI"))?;
        Self::check_readable(uri, &origin)?;

        let name = sanitize_filename(display_name).map_err(|e| Error::source_unreadable(uri, e))?;
        fs::create_dir_all(&self.cache_dir).map_err(|e| Error::source_unreadable(uri, e))?;
        let destination = self.cache_dir.join(name);

        if same_file(&origin, &destination) {
            debug!("{} is already in the cache", uri);
            return Ok(destination);
        }

        info!("Copying {} into cache", uri);
        fs::copy(&origin, &destination).map_err(|e| Error::source_unreadable(uri, e))?;
        debug!("Materialized {} at {}", uri, destination.display());
        Ok(destination)
    }
}

/// Both paths exist and resolve to the same file
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl SourceAcquirer for CacheSourceAcquirer {
    fn acquire(&self, source: &SourceRef) -> Result<PathBuf> {
        match source {
            SourceRef::Path(path) => {
                Self::check_readable(&path.display().to_string(), path)?;
                Ok(path.clone())
            }
            SourceRef::Handle { uri, display_name } => self.materialize(uri, display_name),
        }
    }
}
