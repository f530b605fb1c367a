//! Progress reporting and cancellation.
//!
//! `ProgressCallback` decouples the engine from any particular front end:
//! a CLI can print percentages, a GUI can drive a progress bar, tests can
//! record the call sequence. All methods are called synchronously from the
//! worker executing the run, in emission order.
//!
//! `CancelFlag` lets the controlling context request a stop. The engine
//! checks it between files only; the file in flight always completes.

use crate::model::{BatchJob, FileTask};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Trait for receiving progress updates from a batch run.
pub trait ProgressCallback: Send {
    /// Called once when the run starts.
    fn on_batch_started(&self, job: &BatchJob);

    /// Called when a file is about to be processed.
    fn on_file_started(&self, job: &BatchJob, index: usize, task: &FileTask);

    /// Called when a file reaches a terminal state (done or failed).
    fn on_file_completed(&self, job: &BatchJob, index: usize, task: &FileTask);

    /// Called with `floor(completed / total * 100)` after each handled file.
    ///
    /// Percentages are non-decreasing over one run and the final value of a
    /// run that was not cancelled is exactly 100. A run that matches zero
    /// files reports a single 100.
    fn on_progress(&self, job: &BatchJob, percent: u8);

    /// Called once when the run is complete (all files handled or the run
    /// was cancelled).
    fn on_batch_completed(&self, job: &BatchJob);
}

/// Shared token for requesting that a run stop after the current file.
///
/// Clones share the same underlying flag, so the controller keeps one clone
/// and hands another to whatever owns the run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Request cancellation. Idempotent; cannot be revoked.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
