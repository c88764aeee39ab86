// src/filesystem/mod.rs

//! Filesystem primitives used by the install pipeline
//!
//! The pipeline never touches `std::fs` for manifest reading, member
//! enumeration or expansion file placement directly; it goes
//! through [`FileSystem`] so tests can substitute their own implementation.
//! Archive extraction is the exception: it writes straight to disk.

pub mod path;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One entry returned by [`FileSystem::read_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Blocking filesystem operations
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a regular file, returning the number of bytes written
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// List the immediate entries of a directory, sorted by name
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        // read_dir order is filesystem-dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}
