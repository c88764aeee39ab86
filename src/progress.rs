// src/progress.rs

//! Progress reporting for the install pipeline
//!
//! The pipeline reports phase changes through [`ProgressTracker`] so the
//! same code can drive a terminal spinner, log lines, or a GUI callback.
//!
//! - `SilentProgress`: no-op
//! - `LogProgress`: logs to tracing
//! - `CallbackProgress`: forwards [`ProgressEvent`]s to a closure
//!
//! The CLI adds an indicatif-backed tracker in `commands::progress`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Core trait for progress tracking
///
/// Implementations must be thread-safe; expansion files are copied in
/// parallel and each copy reports on completion.
pub trait ProgressTracker: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Increment progress by the given amount
    fn increment(&self, amount: u64);

    /// Set the total (length) of the progress
    fn set_length(&self, length: u64);

    fn position(&self) -> u64;

    fn length(&self) -> u64;

    /// Finish progress successfully with a message
    fn finish_with_message(&self, message: &str);

    /// Finish progress with an error message
    fn finish_with_error(&self, message: &str);

    fn is_finished(&self) -> bool;

    /// Announce a pipeline phase
    fn set_phase(&self, phase: &InstallPhase) {
        self.set_message(&phase.to_string());
    }
}

/// Phases of an install as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPhase {
    CheckingPermissions,
    Selecting,
    CopyingSource,
    Parsing,
    PlacingData(usize),
    Installing,
    CleaningUp,
    Complete,
}

impl std::fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckingPermissions => write!(f, "Checking permissions..."),
            Self::Selecting => write!(f, "Selecting file..."),
            Self::CopyingSource => write!(f, "Copying file..."),
            Self::Parsing => write!(f, "Parsing package..."),
            Self::PlacingData(count) => write!(f, "Copying OBB files ({})...", count),
            Self::Installing => write!(f, "Installing..."),
            Self::CleaningUp => write!(f, "Cleaning up..."),
            Self::Complete => write!(f, "Installation request sent"),
        }
    }
}

/// Silent progress tracker (no-op)
#[derive(Debug, Default)]
pub struct SilentProgress {
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn finish_with_error(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Logging progress tracker
///
/// Logs messages and completion to tracing at info level, for
/// non-interactive use.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }

    fn increment(&self, amount: u64) {
        let new_pos = self.position.fetch_add(amount, Ordering::Relaxed) + amount;
        let length = self.length.load(Ordering::Relaxed);
        if length > 0 {
            info!("{}: {}/{}", self.name, new_pos, length);
        }
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: {}", self.name, message);
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: ERROR - {}", self.name, message);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Events emitted by [`CallbackProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Message(String),
    Position { current: u64, total: u64 },
    Finished(String),
    Error(String),
}

/// Callback-based progress tracker, for GUI integration
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl<F> ProgressTracker for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn set_message(&self, message: &str) {
        (self.callback)(ProgressEvent::Message(message.to_string()));
    }

    fn increment(&self, amount: u64) {
        let new_pos = self.position.fetch_add(amount, Ordering::Relaxed) + amount;
        (self.callback)(ProgressEvent::Position {
            current: new_pos,
            total: self.length.load(Ordering::Relaxed),
        });
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Finished(message.to_string()));
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Error(message.to_string()));
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}
