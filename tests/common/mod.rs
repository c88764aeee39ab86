// tests/common/mod.rs

//! Shared fixtures and fake collaborators for integration tests.

#![allow(dead_code)]

use splitinstall::filesystem::{DirEntry, FileSystem, LocalFileSystem};
use splitinstall::{
    Collaborators, InstallPipeline, InstallRejection, InstallerConfig, PermissionProvider,
    PlatformInstaller, RejectionStatus, Result, SourceAcquirer, SourceRef,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::FileOptions;

/// Write a zip archive with the given entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Temporary device storage and cache, with a config pointing at them.
pub struct Fixture {
    pub temp: TempDir,
    pub config: InstallerConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = InstallerConfig {
            storage_root: temp.path().join("storage"),
            cache_dir: temp.path().join("cache"),
            ..Default::default()
        };
        Self { temp, config }
    }

    /// Path for an input file next to (not inside) storage and cache
    pub fn input(&self, name: &str) -> PathBuf {
        let dir = self.temp.path().join("input");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    pub fn data_root(&self) -> PathBuf {
        self.config.data_root()
    }

    /// Extraction directories left behind in the cache
    pub fn leftover_working_dirs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.config.cache_dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().path())
                .filter(|p| {
                    p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with("extract_"))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Permission provider with fixed answers that records requests.
#[derive(Clone, Default)]
pub struct FakePermissions {
    pub storage: bool,
    pub install: bool,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl FakePermissions {
    pub fn granted() -> Self {
        Self {
            storage: true,
            install: true,
            ..Default::default()
        }
    }
}

impl PermissionProvider for FakePermissions {
    fn has_broad_storage_access(&self) -> bool {
        self.storage
    }

    fn has_install_capability(&self) -> bool {
        self.install
    }

    fn request_broad_storage_access(&self) {
        self.requests.lock().unwrap().push("storage".into());
    }

    fn request_install_capability(&self) {
        self.requests.lock().unwrap().push("install".into());
    }
}

/// Returns paths as-is and counts calls.
#[derive(Clone, Default)]
pub struct FakeSource {
    pub calls: Arc<AtomicUsize>,
}

impl SourceAcquirer for FakeSource {
    fn acquire(&self, source: &SourceRef) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match source {
            SourceRef::Path(path) if path.is_file() => Ok(path.clone()),
            other => Err(splitinstall::Error::source_unreadable(
                other.to_string(),
                "not found",
            )),
        }
    }
}

/// One call to the fake installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCall {
    pub multiple: bool,
    /// File names, in the order given
    pub names: Vec<String>,
    /// Whether every file existed when the call was made
    pub all_present: bool,
}

/// Installer that records calls and optionally rejects them.
#[derive(Clone, Default)]
pub struct FakeInstaller {
    pub calls: Arc<Mutex<Vec<InstallCall>>>,
    pub reject_with: Option<RejectionStatus>,
}

impl FakeInstaller {
    pub fn rejecting(status: RejectionStatus) -> Self {
        Self {
            reject_with: Some(status),
            ..Default::default()
        }
    }

    fn record(&self, multiple: bool, apks: &[PathBuf]) -> std::result::Result<(), InstallRejection> {
        self.calls.lock().unwrap().push(InstallCall {
            multiple,
            names: apks
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect(),
            all_present: apks.iter().all(|p| p.is_file()),
        });
        match self.reject_with {
            Some(status) => Err(InstallRejection::new(status, "rejected by test")),
            None => Ok(()),
        }
    }
}

impl PlatformInstaller for FakeInstaller {
    fn install_single(&self, apk: &Path) -> std::result::Result<(), InstallRejection> {
        self.record(false, &[apk.to_path_buf()])
    }

    fn install_multiple(&self, apks: &[PathBuf]) -> std::result::Result<(), InstallRejection> {
        self.record(true, apks)
    }
}

/// Local filesystem that counts every call and fails copies to
/// destinations whose file name is in `fail_copies_to`.
#[derive(Clone, Default)]
pub struct TrackingFs {
    pub calls: Arc<AtomicUsize>,
    pub fail_copies_to: Vec<String>,
}

impl TrackingFs {
    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl FileSystem for TrackingFs {
    fn exists(&self, path: &Path) -> bool {
        self.touch();
        LocalFileSystem.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.touch();
        LocalFileSystem.create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.touch();
        let name = to.file_name().map(|n| n.to_string_lossy().into_owned());
        if name.is_some_and(|n| self.fail_copies_to.contains(&n)) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        LocalFileSystem.copy_file(from, to)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.touch();
        LocalFileSystem.read_dir(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.touch();
        LocalFileSystem.read_to_string(path)
    }
}

/// Handles to the fakes wired into a pipeline
pub struct Harness {
    pub pipeline: InstallPipeline,
    pub permissions: FakePermissions,
    pub source: FakeSource,
    pub installer: FakeInstaller,
    pub fs: TrackingFs,
}

impl Harness {
    pub fn new(fixture: &Fixture) -> Self {
        Self::with(fixture, FakePermissions::granted(), FakeInstaller::default(), TrackingFs::default())
    }

    pub fn with(
        fixture: &Fixture,
        permissions: FakePermissions,
        installer: FakeInstaller,
        fs: TrackingFs,
    ) -> Self {
        let source = FakeSource::default();
        let collaborators = Collaborators::new(
            Box::new(permissions.clone()),
            Box::new(source.clone()),
            Box::new(installer.clone()),
        )
        .with_fs(Box::new(fs.clone()));

        Self {
            pipeline: InstallPipeline::new(fixture.config.clone(), collaborators),
            permissions,
            source,
            installer,
            fs,
        }
    }

    pub fn install_calls(&self) -> Vec<InstallCall> {
        self.installer.calls.lock().unwrap().clone()
    }
}
