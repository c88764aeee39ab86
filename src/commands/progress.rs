// src/commands/progress.rs
//! Terminal progress for install requests
//!
//! A spinner shows the current pipeline phase; while expansion files are
//! copied it becomes a bar counting placed files.

use indicatif::{ProgressBar, ProgressStyle};
use splitinstall::ProgressTracker;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:30.blue/dim}] {pos}/{len}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .progress_chars("=>-")
}

/// indicatif-backed [`ProgressTracker`]
pub struct InstallProgress {
    bar: ProgressBar,
}

impl InstallProgress {
    pub fn new(source: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(style(SPINNER_TEMPLATE));
        bar.set_message(format!("Installing {}", source));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressTracker for InstallProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn set_length(&self, length: u64) {
        self.bar.set_style(style(BAR_TEMPLATE));
        self.bar.set_position(0);
        self.bar.set_length(length);
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.set_style(style(SPINNER_TEMPLATE));
        self.bar.finish_with_message(message.to_string());
    }

    fn finish_with_error(&self, message: &str) {
        self.bar.set_style(style(SPINNER_TEMPLATE));
        self.bar.abandon_with_message(format!("FAILED: {}", message));
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
