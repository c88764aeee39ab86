// src/config.rs

//! Installer configuration
//!
//! # Example config.toml
//!
//! ```toml
//! # External storage root on the device; OBB files go under Android/obb
//! storage_root = "/storage/emulated/0"
//!
//! # Private cache for copied sources and extraction directories
//! cache_dir = "/home/me/.cache/splitinstall"
//!
//! [adb]
//! program = "adb"
//! serial = "emulator-5554"
//! extra_args = ["-r"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the storage root that holds expansion files
pub const DATA_SUBDIR: &str = "Android/obb";

/// Errors loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub storage_root: PathBuf,
    pub cache_dir: PathBuf,
    pub adb: AdbConfig,
}

/// `[adb]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    pub program: String,
    /// Target device (`adb -s`)
    pub serial: Option<String>,
    /// Passed to every install invocation
    pub extra_args: Vec<String>,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            program: "adb".to_string(),
            serial: None,
            extra_args: Vec::new(),
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("/storage/emulated/0"),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("splitinstall"),
            adb: AdbConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Root under which expansion files are placed, one directory per package
    pub fn data_root(&self) -> PathBuf {
        self.storage_root.join(DATA_SUBDIR)
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("splitinstall").join("config.toml"))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file that must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, otherwise the default file if it exists,
    /// otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::load(&default),
                _ => Ok(Self::default()),
            },
        }
    }
}
