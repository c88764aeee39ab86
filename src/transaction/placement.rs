// src/transaction/placement.rs

//! Expansion file placement
//!
//! Copies are independent of each other, so they run in parallel. A failed
//! copy never stops the others; every failure is collected and returned.

use crate::filesystem::FileSystem;
use crate::packages::AuxiliaryFile;
use crate::progress::ProgressTracker;
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// An expansion file that could not be copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.source.display(),
            self.destination.display(),
            self.reason
        )
    }
}

fn place_one(fs: &dyn FileSystem, aux: &AuxiliaryFile) -> io::Result<u64> {
    if let Some(parent) = aux.destination.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.copy_file(&aux.source, &aux.destination)
}

/// Copy every expansion file to its destination
///
/// Returns the failures in input order; an empty vector means everything
/// was placed.
pub fn place_auxiliaries(
    fs: &dyn FileSystem,
    auxiliaries: &[AuxiliaryFile],
    progress: &dyn ProgressTracker,
) -> Vec<PlacementFailure> {
    progress.set_length(auxiliaries.len() as u64);

    auxiliaries
        .par_iter()
        .filter_map(|aux| {
            let result = place_one(fs, aux);
            progress.increment(1);
            match result {
                Ok(bytes) => {
                    debug!("Placed {} ({} bytes)", aux.destination.display(), bytes);
                    None
                }
                Err(e) => {
                    warn!("Failed to place {}: {}", aux.destination.display(), e);
                    Some(PlacementFailure {
                        source: aux.source.clone(),
                        destination: aux.destination.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        })
        .collect()
}
