// src/commands/install.rs
//! Package installation command

use super::progress::InstallProgress;
use anyhow::{Result, anyhow};
use splitinstall::{
    AdbInstaller, CacheSourceAcquirer, Collaborators, HostPermissions, InstallOutcome,
    InstallPipeline, InstallReport, InstallerConfig, ProgressTracker, SilentProgress, SourceRef,
};
use std::sync::Arc;
use tracing::info;

/// Install a package file on the connected device
pub fn cmd_install(source: &str, config: InstallerConfig, quiet: bool) -> Result<()> {
    let installer = AdbInstaller::new(&config.adb);
    let permissions = HostPermissions::new(config.data_root(), installer.clone());
    let acquirer = CacheSourceAcquirer::new(&config.cache_dir);

    let progress: Arc<dyn ProgressTracker> = if quiet {
        Arc::new(SilentProgress::new())
    } else {
        Arc::new(InstallProgress::new(source))
    };

    let collaborators = Collaborators::new(
        Box::new(permissions),
        Box::new(acquirer),
        Box::new(installer),
    )
    .with_progress(progress);

    let mut pipeline = InstallPipeline::new(config, collaborators);
    let reference = SourceRef::parse(source);
    info!("Install request for {}", reference);

    let report = pipeline.run(|| Some(reference));
    print_report(&report);

    match report.outcome {
        InstallOutcome::Succeeded => Ok(()),
        InstallOutcome::Cancelled => {
            println!("No package selected");
            Ok(())
        }
        InstallOutcome::Failed { stage, error } => {
            Err(anyhow!(error).context(format!("Installation failed ({})", stage)))
        }
    }
}

fn print_report(report: &InstallReport) {
    if let Some(kind) = report.kind {
        println!("Format: {}", kind);
    }
    if let Some(label) = &report.label {
        println!("Name: {}", label);
    }
    if let Some(id) = &report.package_identifier {
        match &report.version_label {
            Some(version) => println!("Package: {} {}", id, version),
            None => println!("Package: {}", id),
        }
    }

    if report.auxiliaries_discovered > 0 {
        println!(
            "Expansion files: {} placed, {} found",
            report.auxiliaries_placed, report.auxiliaries_discovered
        );
        if report.auxiliaries_dropped > 0 {
            println!(
                "  {} skipped (no package name in manifest)",
                report.auxiliaries_dropped
            );
        }
    }
    if let Some(err) = report.placement_error() {
        eprintln!("WARNING: {}", err);
        for failure in &report.placement_failures {
            eprintln!("  {}", failure);
        }
    }

    if report.is_success() {
        println!("Installed {} APK(s)", report.units_installed);
    }
}
