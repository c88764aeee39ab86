// src/platform/adb.rs

//! Host-side collaborators backed by `adb`

use super::{InstallRejection, PermissionProvider, PlatformInstaller, RejectionStatus};
use crate::config::AdbConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Installs APKs on a connected device with `adb install[-multiple]`
#[derive(Debug, Clone)]
pub struct AdbInstaller {
    program: String,
    serial: Option<String>,
    extra_args: Vec<String>,
}

impl AdbInstaller {
    pub fn new(config: &AdbConfig) -> Self {
        Self {
            program: config.program.clone(),
            serial: config.serial.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Full path of the adb executable, if it can be found
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    fn check_present(apks: &[PathBuf]) -> Result<(), InstallRejection> {
        match apks.iter().find(|apk| !apk.is_file()) {
            Some(missing) => Err(InstallRejection::new(
                RejectionStatus::Invalid,
                format!("APK file not found: {}", missing.display()),
            )),
            None => Ok(()),
        }
    }

    fn run(&self, subcommand: &str, apks: &[PathBuf]) -> Result<(), InstallRejection> {
        Self::check_present(apks)?;

        let program = self.locate().ok_or_else(|| {
            InstallRejection::new(
                RejectionStatus::Failure,
                format!("{} not found in PATH", self.program),
            )
        })?;

        let mut command = Command::new(&program);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
            .arg(subcommand)
            .args(&self.extra_args)
            .args(apks)
            .stdin(Stdio::null());

        debug!("Running {:?}", command);
        let output = command.output().map_err(|e| {
            InstallRejection::new(
                RejectionStatus::Failure,
                format!("failed to run {}: {}", program.display(), e),
            )
        })?;

        parse_install_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

impl PlatformInstaller for AdbInstaller {
    fn install_single(&self, apk: &Path) -> Result<(), InstallRejection> {
        info!("adb install {}", apk.display());
        self.run("install", &[apk.to_path_buf()])
    }

    fn install_multiple(&self, apks: &[PathBuf]) -> Result<(), InstallRejection> {
        info!("adb install-multiple ({} APKs)", apks.len());
        self.run("install-multiple", apks)
    }
}

/// Interpret adb's output
///
/// adb reports `Failure [INSTALL_FAILED_...: message]` on either stream and
/// does not always exit non-zero when it does.
fn parse_install_output(success: bool, stdout: &str, stderr: &str) -> Result<(), InstallRejection> {
    let failure = stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|line| line.starts_with("Failure") || line.starts_with("adb: failed"));

    if let Some(line) = failure {
        let code = line
            .split_once('[')
            .and_then(|(_, rest)| rest.split([']', ':', ' ']).next())
            .unwrap_or("");
        return Err(InstallRejection::new(RejectionStatus::from_code(code), line));
    }

    if !success {
        let reason = stderr.trim();
        return Err(InstallRejection::new(
            RejectionStatus::Failure,
            if reason.is_empty() { "adb exited with an error" } else { reason },
        ));
    }

    Ok(())
}

/// Permission checks for running on a host with adb
#[derive(Debug, Clone)]
pub struct HostPermissions {
    data_root: PathBuf,
    installer: AdbInstaller,
}

impl HostPermissions {
    pub fn new(data_root: impl Into<PathBuf>, installer: AdbInstaller) -> Self {
        Self {
            data_root: data_root.into(),
            installer,
        }
    }

    fn nearest_existing(&self) -> Option<&Path> {
        self.data_root.ancestors().find(|p| p.is_dir())
    }
}

impl PermissionProvider for HostPermissions {
    fn has_broad_storage_access(&self) -> bool {
        // A real write is the only reliable check across filesystems
        self.nearest_existing()
            .is_some_and(|dir| tempfile::tempfile_in(dir).is_ok())
    }

    fn has_install_capability(&self) -> bool {
        self.installer.locate().is_some()
    }

    fn request_broad_storage_access(&self) {
        warn!(
            "Grant write access to {} (or pass --storage-root) and retry",
            self.data_root.display()
        );
    }

    fn request_install_capability(&self) {
        warn!("Install Android platform-tools so that adb is on PATH, then retry");
    }
}
