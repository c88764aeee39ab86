// src/commands/inspect.rs
//! Show what an install would do

use anyhow::Result;
use splitinstall::{
    AdbInstaller, CacheSourceAcquirer, Collaborators, HostPermissions, InstallPipeline,
    InstallerConfig,
};
use std::path::Path;

/// Parse a package and print its install plan
///
/// Nothing is copied to the device; the extraction directory is removed
/// before returning.
pub fn cmd_inspect(path: &Path, config: InstallerConfig) -> Result<()> {
    let installer = AdbInstaller::new(&config.adb);
    let permissions = HostPermissions::new(config.data_root(), installer.clone());
    let acquirer = CacheSourceAcquirer::new(&config.cache_dir);
    let pipeline = InstallPipeline::new(
        config,
        Collaborators::new(Box::new(permissions), Box::new(acquirer), Box::new(installer)),
    );

    let mut plan = pipeline.inspect(path)?;

    println!("Format: {}", plan.kind);
    if let Some(manifest) = &plan.manifest {
        if let Some(label) = &manifest.label {
            println!("Name: {}", label);
        }
        if let Some(id) = &manifest.package_identifier {
            println!("Package: {}", id);
        }
        if let Some(version) = &manifest.version_label {
            println!("Version: {}", version);
        }
        if let Some(code) = &manifest.version_code {
            println!("Version code: {}", code);
        }
        if let Some(sdk) = &manifest.min_sdk_version {
            println!("Min SDK: {}", sdk);
        }
        if let Some(sdk) = &manifest.target_sdk_version {
            println!("Target SDK: {}", sdk);
        }
    }

    println!("\nAPKs ({}), in install order:", plan.units.len());
    for unit in &plan.units {
        let name = unit.file_name().map(|n| n.to_string_lossy().into_owned());
        println!("  {}", name.unwrap_or_else(|| unit.display().to_string()));
    }

    if !plan.auxiliaries.is_empty() {
        println!("\nExpansion files ({}):", plan.auxiliaries.len());
        for aux in &plan.auxiliaries {
            let name = aux.source.file_name().unwrap_or_default().to_string_lossy();
            println!("  {} -> {}", name, aux.destination.display());
        }
    }
    if !plan.dropped.is_empty() {
        println!("\nSkipped expansion files ({}):", plan.dropped.len());
        for dropped in &plan.dropped {
            if let Some(name) = dropped.file_name() {
                println!("  {}", name.to_string_lossy());
            }
        }
    }

    plan.close()?;
    Ok(())
}
