//! Progress plumbing between the worker thread and the terminal.
//!
//! The engine invokes its callback on the worker thread; `ChannelProgress`
//! forwards each invocation as a `WorkerEvent` over a crossbeam channel.
//! The channel is unbounded and drained in order on the receiving side, so
//! events arrive FIFO and none are dropped or coalesced; the 100% event of
//! a completed run is always observed.

use crossbeam_channel::Sender;
use engine::{BatchJob, FileState, FileTask, ProgressCallback};
use std::time::Duration;

/// One progress notification crossing from the worker to the controller.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    BatchStarted {
        total_files: usize,
        total_bytes: u64,
    },
    FileStarted {
        index: usize,
        name: String,
    },
    FileCompleted {
        index: usize,
        name: String,
        state: FileState,
    },
    Progress {
        percent: u8,
    },
    BatchCompleted,
}

/// A ProgressCallback implementation that sends updates over a channel.
pub struct ChannelProgress {
    sender: Sender<WorkerEvent>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<WorkerEvent>) -> Self {
        ChannelProgress { sender }
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_batch_started(&self, job: &BatchJob) {
        let _ = self.sender.send(WorkerEvent::BatchStarted {
            total_files: job.files.len(),
            total_bytes: job.total_bytes_to_process,
        });
    }

    fn on_file_started(&self, _job: &BatchJob, index: usize, task: &FileTask) {
        let _ = self.sender.send(WorkerEvent::FileStarted {
            index,
            name: task.source_name(),
        });
    }

    fn on_file_completed(&self, _job: &BatchJob, index: usize, task: &FileTask) {
        let _ = self.sender.send(WorkerEvent::FileCompleted {
            index,
            name: task.source_name(),
            state: task.state,
        });
    }

    fn on_progress(&self, _job: &BatchJob, percent: u8) {
        let _ = self.sender.send(WorkerEvent::Progress { percent });
    }

    fn on_batch_completed(&self, _job: &BatchJob) {
        let _ = self.sender.send(WorkerEvent::BatchCompleted);
    }
}

/// Renders worker events to stderr.
pub struct ProgressRenderer {
    verbose: bool,
}

impl ProgressRenderer {
    pub fn new(verbose: bool) -> Self {
        ProgressRenderer { verbose }
    }

    pub fn handle(&self, event: &WorkerEvent) {
        match event {
            WorkerEvent::BatchStarted {
                total_files,
                total_bytes,
            } => {
                eprintln!(
                    "Processing {} file(s), {} total",
                    total_files,
                    format_bytes(*total_bytes)
                );
            }
            WorkerEvent::FileStarted { index, name } => {
                if self.verbose {
                    eprintln!("[{:3}] Starting: {}", index, name);
                }
            }
            WorkerEvent::FileCompleted { index, name, state } => {
                if self.verbose {
                    let status = match state {
                        FileState::Done => "Done",
                        FileState::Skipped => "Skipped",
                        FileState::Failed => "Failed",
                        _ => "Unknown",
                    };
                    eprintln!("[{:3}] {}: {}", index, status, name);
                }
            }
            WorkerEvent::Progress { percent } => {
                eprint!("\rProgress: {}", render_bar(*percent));
                let _ = std::io::Write::flush(&mut std::io::stderr());
            }
            WorkerEvent::BatchCompleted => {
                eprintln!();
            }
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

fn render_bar(percent: u8) -> String {
    let filled = (percent / 5) as usize;
    let empty = 20 - filled;
    format!("[{}{}] {}%", "=".repeat(filled), " ".repeat(empty), percent)
}
