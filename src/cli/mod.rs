// src/cli/mod.rs
//! CLI definitions for splitinstall
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "splitinstall")]
#[command(version)]
#[command(about = "Install APK, XAPK, APKS and APKM packages on an Android device", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/splitinstall/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Device storage root; expansion files go under <root>/Android/obb
    #[arg(long, global = true)]
    pub storage_root: Option<PathBuf>,

    /// Directory for copied sources and extraction
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Target device serial (adb -s)
    #[arg(short, long, global = true)]
    pub serial: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a package file
    Install {
        /// Path or URI of the .apk, .xapk, .apks or .apkm file
        source: String,

        /// Do not show a progress spinner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show what installing a package would do, without installing
    Inspect {
        /// Path to the package file
        path: PathBuf,
    },

    /// Print the container kind of each file name
    Detect {
        /// File names or paths
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
