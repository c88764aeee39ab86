// src/commands/mod.rs
//! Command handlers for the splitinstall CLI

mod inspect;
mod install;
pub mod progress;

pub use inspect::cmd_inspect;
pub use install::cmd_install;

use anyhow::{Context, Result, anyhow};
use clap::CommandFactory;
use clap_complete::Shell;
use splitinstall::{InstallerConfig, detect_format};
use std::path::PathBuf;

/// Settings given on the command line, taking precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub storage_root: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub serial: Option<String>,
}

/// Load the config file and apply command-line overrides
pub fn load_config(overrides: &Overrides) -> Result<InstallerConfig> {
    let mut config = InstallerConfig::load_or_default(overrides.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(root) = &overrides.storage_root {
        config.storage_root = root.clone();
    }
    if let Some(cache) = &overrides.cache_dir {
        config.cache_dir = cache.clone();
    }
    if let Some(serial) = &overrides.serial {
        config.adb.serial = Some(serial.clone());
    }
    Ok(config)
}

/// Print the container kind for each file name
pub fn cmd_detect(names: &[String]) -> Result<()> {
    let mut unsupported = 0;
    for name in names {
        match detect_format(name) {
            Ok(kind) => println!("{}: {}", name, kind),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                unsupported += 1;
            }
        }
    }

    if unsupported > 0 {
        return Err(anyhow!("{} of {} file(s) not recognized", unsupported, names.len()));
    }
    Ok(())
}

/// Generate shell completions
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut cmd, "splitinstall", &mut std::io::stdout());
    Ok(())
}
