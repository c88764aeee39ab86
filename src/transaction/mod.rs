// src/transaction/mod.rs

//! Install pipeline
//!
//! Drives one install request from permission checks to the platform
//! installer. Each request walks a fixed sequence of states:
//!
//! ```text
//! IDLE -> PERMISSION_PENDING -> SOURCE_ACQUIRED -> PARSED -> AUXILIARY_PLACED -> INSTALLED -> DONE
//!              |                      |              |              |                |
//!              +----------------------+------> FAILED <-------------+----------------+
//! ```
//!
//! A cancelled file selection goes back to `IDLE`. The extraction directory
//! is owned by the [`InstallPlan`] and is deleted on every path out of
//! `PARSED`, success or failure. Expansion files that cannot be copied are
//! reported but never stop the install; a rejection from the platform
//! installer always does.

mod placement;
mod planner;

pub use placement::{PlacementFailure, place_auxiliaries};
pub use planner::{BASE_UNIT_TOKEN, InstallPlan, build_plan, order_units};

use crate::config::InstallerConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::filesystem::{FileSystem, LocalFileSystem};
use crate::packages::{ContainerKind, classify, detect_format, extract_archive, read_manifest};
use crate::platform::{
    Capability, InstallRejection, PermissionProvider, PlatformInstaller, RejectionStatus,
    SourceAcquirer, SourceRef,
};
use crate::progress::{InstallPhase, ProgressTracker, SilentProgress};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of extraction directories created under the cache directory
pub const WORKING_DIR_PREFIX: &str = "extract_";

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallState {
    /// No request in flight
    Idle,
    /// Checking storage and install permissions
    PermissionPending,
    /// A local, readable copy of the source exists
    SourceAcquired,
    /// Container detected, extracted and classified
    Parsed,
    /// Expansion file copies finished (some may have failed)
    AuxiliaryPlaced,
    /// Platform installer accepted the package
    Installed,
    /// Request complete, working directory removed
    Done,
    Failed,
}

impl InstallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state a successful step moves to
    fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::PermissionPending),
            Self::PermissionPending => Some(Self::SourceAcquired),
            Self::SourceAcquired => Some(Self::Parsed),
            Self::Parsed => Some(Self::AuxiliaryPlaced),
            Self::AuxiliaryPlaced => Some(Self::Installed),
            Self::Installed => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }
}

impl std::fmt::Display for InstallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PermissionPending => "permission-pending",
            Self::SourceAcquired => "source-acquired",
            Self::Parsed => "parsed",
            Self::AuxiliaryPlaced => "auxiliary-placed",
            Self::Installed => "installed",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// How a request ended
#[derive(Debug)]
pub enum InstallOutcome {
    /// The platform installer accepted the package
    Succeeded,
    /// No file was selected
    Cancelled,
    /// The request stopped in `stage`
    Failed { stage: InstallState, error: Error },
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Kind of the fatal error, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { error, .. } => Some(error.kind()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of one install request
#[derive(Debug)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    /// Detected container kind, once known
    pub kind: Option<ContainerKind>,
    pub package_identifier: Option<String>,
    pub version_label: Option<String>,
    /// Display name from the manifest
    pub label: Option<String>,
    pub units_installed: usize,
    pub auxiliaries_placed: usize,
    pub auxiliaries_discovered: usize,
    /// Expansion files found without a package to place them under
    pub auxiliaries_dropped: usize,
    pub placement_failures: Vec<PlacementFailure>,
}

impl InstallReport {
    fn new() -> Self {
        Self {
            outcome: InstallOutcome::Cancelled,
            kind: None,
            package_identifier: None,
            version_label: None,
            label: None,
            units_installed: 0,
            auxiliaries_placed: 0,
            auxiliaries_discovered: 0,
            auxiliaries_dropped: 0,
            placement_failures: Vec::new(),
        }
    }

    fn record_plan(&mut self, plan: &InstallPlan) {
        self.kind = Some(plan.kind);
        if let Some(manifest) = &plan.manifest {
            self.package_identifier = manifest.package_identifier.clone();
            self.version_label = manifest.version_label.clone();
            self.label = manifest.label.clone();
        }
        self.auxiliaries_discovered = plan.auxiliaries.len() + plan.dropped.len();
        self.auxiliaries_dropped = plan.dropped.len();
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The non-fatal placement error, if any copy failed
    pub fn placement_error(&self) -> Option<Error> {
        if self.placement_failures.is_empty() {
            None
        } else {
            Some(Error::AuxiliaryPlacementPartialFailure(
                self.placement_failures.clone(),
            ))
        }
    }
}

/// Outside services the pipeline is driven against
pub struct Collaborators {
    pub permissions: Box<dyn PermissionProvider>,
    pub source: Box<dyn SourceAcquirer>,
    pub installer: Box<dyn PlatformInstaller>,
    pub fs: Box<dyn FileSystem>,
    pub progress: Arc<dyn ProgressTracker>,
}

impl Collaborators {
    /// Use the local filesystem and report no progress
    pub fn new(
        permissions: Box<dyn PermissionProvider>,
        source: Box<dyn SourceAcquirer>,
        installer: Box<dyn PlatformInstaller>,
    ) -> Self {
        Self {
            permissions,
            source,
            installer,
            fs: Box::new(LocalFileSystem),
            progress: Arc::new(SilentProgress::new()),
        }
    }

    pub fn with_fs(mut self, fs: Box<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }
}

/// Runs install requests one at a time
pub struct InstallPipeline {
    config: InstallerConfig,
    collaborators: Collaborators,
    state: InstallState,
    history: Vec<InstallState>,
}

impl InstallPipeline {
    pub fn new(config: InstallerConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            state: InstallState::Idle,
            history: vec![InstallState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> InstallState {
        self.state
    }

    /// States visited by the most recent request, in order
    pub fn history(&self) -> &[InstallState] {
        &self.history
    }

    fn progress(&self) -> &dyn ProgressTracker {
        self.collaborators.progress.as_ref()
    }

    fn enter(&mut self, state: InstallState) {
        debug_assert!(
            state == InstallState::Failed || self.state.next() == Some(state),
            "invalid transition {} -> {}",
            self.state,
            state
        );
        debug!("Install state: {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
    }

    fn fail(&mut self, mut report: InstallReport, error: Error) -> InstallReport {
        let stage = self.state;
        warn!("Install failed in {}: {}", stage, error);
        self.progress().finish_with_error(&error.to_string());
        self.enter(InstallState::Failed);
        report.outcome = InstallOutcome::Failed { stage, error };
        report
    }

    /// Handle one install request
    ///
    /// `pick` is the file selection step; it runs only after both
    /// permissions are confirmed, and returning `None` cancels the request.
    /// Failures are reported in the returned [`InstallReport`], never as a
    /// panic or an `Err`.
    pub fn run<F>(&mut self, pick: F) -> InstallReport
    where
        F: FnOnce() -> Option<SourceRef>,
    {
        self.state = InstallState::Idle;
        self.history = vec![InstallState::Idle];
        let mut report = InstallReport::new();

        self.enter(InstallState::PermissionPending);
        self.progress().set_phase(&InstallPhase::CheckingPermissions);
        if let Err(e) = self.check_permissions() {
            return self.fail(report, e);
        }

        self.progress().set_phase(&InstallPhase::Selecting);
        let Some(source) = pick() else {
            info!("No file selected");
            self.state = InstallState::Idle;
            self.history.push(InstallState::Idle);
            self.progress().finish_with_message("Cancelled");
            return report;
        };

        if matches!(source, SourceRef::Handle { .. }) {
            self.progress().set_phase(&InstallPhase::CopyingSource);
        }
        let path = match self.collaborators.source.acquire(&source) {
            Ok(path) => path,
            Err(e) => return self.fail(report, e),
        };
        info!("Installing from {}", path.display());
        self.enter(InstallState::SourceAcquired);

        self.progress().set_phase(&InstallPhase::Parsing);
        let mut plan = match self.parse(&path) {
            Ok(plan) => plan,
            Err(e) => return self.fail(report, e),
        };
        report.record_plan(&plan);
        self.enter(InstallState::Parsed);

        let result = self.place_and_install(&plan, &mut report);

        self.progress().set_phase(&InstallPhase::CleaningUp);
        if let Err(e) = plan.close() {
            warn!("Failed to remove working directory: {}", e);
        }

        match result {
            Ok(()) => {
                self.enter(InstallState::Done);
                self.progress()
                    .finish_with_message(&InstallPhase::Complete.to_string());
                report.outcome = InstallOutcome::Succeeded;
                report
            }
            Err(e) => self.fail(report, e),
        }
    }

    /// Confirm both capabilities before any file is touched
    ///
    /// Every missing capability is requested; the first one missing is
    /// reported.
    fn check_permissions(&self) -> Result<()> {
        let permissions = self.collaborators.permissions.as_ref();
        let missing: Vec<Capability> = [Capability::Storage, Capability::Install]
            .into_iter()
            .filter(|&capability| !permissions.has(capability))
            .collect();

        for &capability in &missing {
            info!("Requesting {} permission", capability);
            permissions.request(capability);
        }

        match missing.first() {
            Some(&capability) => Err(Error::PermissionDenied(capability)),
            None => Ok(()),
        }
    }

    /// Detect, extract and classify a local package file
    ///
    /// Does not touch the pipeline state, so it can be used to preview what
    /// an install would do. Dropping the returned plan removes its working
    /// directory.
    pub fn inspect(&self, source: &Path) -> Result<InstallPlan> {
        self.parse(source)
    }

    fn parse(&self, source: &Path) -> Result<InstallPlan> {
        let kind = detect_format(source)?;
        debug!("Detected {} container", kind);

        if !kind.requires_extraction() {
            return build_plan(
                kind,
                None,
                vec![source.to_path_buf()],
                Vec::new(),
                Vec::new(),
                None,
            );
        }

        let fs = self.collaborators.fs.as_ref();
        fs.create_dir_all(&self.config.cache_dir)?;
        let working_dir = tempfile::Builder::new()
            .prefix(WORKING_DIR_PREFIX)
            .tempdir_in(&self.config.cache_dir)?;
        debug!("Extracting into {}", working_dir.path().display());

        let data_root = self.config.data_root();
        let parsed = extract_archive(source, working_dir.path()).and_then(|_| {
            let manifest = match kind {
                ContainerKind::ManifestArchive => read_manifest(fs, working_dir.path())?,
                _ => None,
            };
            let classification =
                classify(fs, kind, working_dir.path(), manifest.as_ref(), &data_root)?;
            Ok((manifest, classification))
        });

        match parsed {
            Ok((manifest, classification)) => build_plan(
                kind,
                manifest,
                classification.units,
                classification.auxiliaries,
                classification.dropped,
                Some(working_dir),
            ),
            Err(e) => {
                if let Err(cleanup) = working_dir.close() {
                    warn!("Failed to remove working directory: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    fn place_and_install(&mut self, plan: &InstallPlan, report: &mut InstallReport) -> Result<()> {
        if !plan.auxiliaries.is_empty() {
            self.progress()
                .set_phase(&InstallPhase::PlacingData(plan.auxiliaries.len()));
            let failures = place_auxiliaries(
                self.collaborators.fs.as_ref(),
                &plan.auxiliaries,
                self.progress(),
            );
            report.auxiliaries_placed = plan.auxiliaries.len() - failures.len();
            if !failures.is_empty() {
                warn!(
                    "{} of {} expansion files could not be placed",
                    failures.len(),
                    plan.auxiliaries.len()
                );
            }
            report.placement_failures = failures;
        }
        self.enter(InstallState::AuxiliaryPlaced);

        self.progress().set_phase(&InstallPhase::Installing);
        self.install(&plan.units)
            .map_err(Error::PlatformInstallRejected)?;
        report.units_installed = plan.units.len();
        self.enter(InstallState::Installed);
        Ok(())
    }

    fn install(&self, units: &[PathBuf]) -> std::result::Result<(), InstallRejection> {
        let fs = self.collaborators.fs.as_ref();
        if let Some(missing) = units.iter().find(|unit| !fs.exists(unit)) {
            return Err(InstallRejection::new(
                RejectionStatus::Invalid,
                format!("APK file not found: {}", missing.display()),
            ));
        }

        let installer = self.collaborators.installer.as_ref();
        match units {
            [single] => installer.install_single(single),
            _ => installer.install_multiple(units),
        }
    }
}
