// src/packages/manifest.rs

//! XAPK `manifest.json` reader
//!
//! Every field is optional. A container without a manifest is normal, and a
//! manifest missing fields is still usable; only text that is not valid
//! JSON is an error.

use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::debug;

/// Name of the manifest at the root of an extracted XAPK
pub const MANIFEST_FILE: &str = "manifest.json";

/// Package identity recovered from `manifest.json`
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    /// Application id, e.g. `com.example.game`
    #[serde(default, rename = "package_name")]
    pub package_identifier: Option<String>,

    /// User-facing version, e.g. `1.4.2`
    #[serde(default, rename = "version_name")]
    pub version_label: Option<String>,

    /// Display name of the application
    #[serde(default, rename = "name")]
    pub label: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version_code: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub min_sdk_version: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub target_sdk_version: Option<String>,
}

impl PackageManifest {
    /// Parse manifest text
    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let mut manifest: Self = serde_json::from_str(content)?;
        // Blank identifiers cannot namespace anything
        if manifest
            .package_identifier
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            manifest.package_identifier = None;
        }
        Ok(manifest)
    }
}

/// XAPK writers disagree on whether numeric fields are strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Load `manifest.json` from an extracted container
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_manifest(fs: &dyn FileSystem, extracted_dir: &Path) -> Result<Option<PackageManifest>> {
    let path = extracted_dir.join(MANIFEST_FILE);
    if !fs.exists(&path) {
        debug!("No manifest at {}", path.display());
        return Ok(None);
    }

    let content = fs.read_to_string(&path)?;
    let manifest = PackageManifest::parse(&content)
        .map_err(|source| Error::ManifestCorrupt { path, source })?;

    debug!(
        "Manifest: package={:?} version={:?}",
        manifest.package_identifier, manifest.version_label
    );
    Ok(Some(manifest))
}
