//! Core data model for batch runs.
//!
//! This module defines the main data structures for representing one batch
//! transform pass:
//! - BatchConfig: the immutable run configuration
//! - BatchJob: the whole run (configuration snapshot plus per-file tasks)
//! - FileTask: a single file within a run
//! - CollisionPolicy, SourceDisposal, FileState, JobState: enums controlling behavior
//! - BatchSummary: the aggregated result handed back to the caller

use crate::checksums::{ChecksumAlgorithm, ChecksumValue};
use crate::xor::XorKey;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Immutable configuration for one batch run.
///
/// A `BatchJob` takes a snapshot of this at creation; nothing mutates it
/// afterwards. The key is validated non-empty by `XorKey` construction, so a
/// `BatchConfig` is transform-safe by the time it exists.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory whose files are read
    pub input_dir: PathBuf,

    /// Glob mask applied to file names in the input directory (e.g. `*.bin`)
    pub file_mask: String,

    /// Directory the transformed files are written to
    pub output_dir: PathBuf,

    /// Repeating XOR key
    pub key: XorKey,

    /// What to do when the candidate output name already exists
    pub collision_policy: CollisionPolicy,

    /// Whether source files are kept or deleted after processing
    pub source_disposal: SourceDisposal,

    /// Re-read and checksum each destination after writing it
    pub verify_after_process: bool,

    /// Algorithm used when `verify_after_process` is set
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
}

impl BatchConfig {
    /// Config with the default mask (`*`), no deletion, no verification.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, key: XorKey) -> Self {
        BatchConfig {
            input_dir,
            file_mask: "*".to_string(),
            output_dir,
            key,
            collision_policy: CollisionPolicy::RenameWithCounter,
            source_disposal: SourceDisposal::Keep,
            verify_after_process: false,
            checksum_algorithm: None,
        }
    }
}

/// Represents a single batch run.
#[derive(Debug)]
pub struct BatchJob {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Immutable configuration snapshot
    pub config: BatchConfig,

    /// All matched files, in processing order
    pub files: Vec<FileTask>,

    /// Current job state (Pending, Running, Completed)
    pub state: JobState,

    /// Total bytes across all matched files
    pub total_bytes_to_process: u64,

    /// Bytes transformed so far
    pub total_bytes_processed: u64,

    /// Index of the file currently being processed (if Running)
    pub current_file_index: Option<usize>,

    /// When the job was created
    pub created_at: SystemTime,

    /// When execution started
    pub start_time: Option<SystemTime>,

    /// When execution completed
    pub end_time: Option<SystemTime>,
}

/// A single file within a batch run.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Unique identifier for this task within the job
    pub id: Uuid,

    /// Full path of the input file
    pub source_path: PathBuf,

    /// Candidate destination (output directory + unchanged file name)
    pub proposed_path: PathBuf,

    /// Destination actually written, set after collision resolution
    pub resolved_path: Option<PathBuf>,

    /// Input size in bytes
    pub file_size: u64,

    /// Current state of this task
    pub state: FileState,

    /// Bytes transformed for this file
    pub bytes_processed: u64,

    /// True if collision resolution picked a countered name
    pub renamed: bool,

    /// OS error code if state is Failed
    pub error_code: Option<u32>,

    /// Human-readable error message
    pub error_message: Option<String>,

    /// Checksum of the source (computed during verification)
    pub source_checksum: Option<ChecksumValue>,

    /// Checksum of the destination read back through the key
    pub restored_checksum: Option<ChecksumValue>,

    /// Whether verification passed (checksums matched)
    pub verification_passed: Option<bool>,
}

impl FileTask {
    /// New pending task for a matched input file.
    pub fn new(source_path: PathBuf, proposed_path: PathBuf, file_size: u64) -> Self {
        FileTask {
            id: Uuid::new_v4(),
            source_path,
            proposed_path,
            resolved_path: None,
            file_size,
            state: FileState::Pending,
            bytes_processed: 0,
            renamed: false,
            error_code: None,
            error_message: None,
            source_checksum: None,
            restored_checksum: None,
            verification_passed: None,
        }
    }

    /// File name of the source, for display.
    pub fn source_name(&self) -> String {
        self.source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("(unknown)")
            .to_string()
    }
}

/// Policy for handling an existing file at the candidate destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the existing file; write to the next free countered name
    RenameWithCounter,
    /// Truncate and overwrite the existing file
    Overwrite,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionPolicy::RenameWithCounter => write!(f, "rename"),
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// What happens to the source file once its destination is fully written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDisposal {
    /// Leave the source in place
    Keep,
    /// Delete the source after the destination is written and closed
    Delete,
}

impl std::fmt::Display for SourceDisposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceDisposal::Keep => write!(f, "keep"),
            SourceDisposal::Delete => write!(f, "delete"),
        }
    }
}

/// The state of an individual file within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Not yet processed
    Pending,
    /// Currently being transformed
    Processing,
    /// Transformed (and verified, if enabled)
    Done,
    /// Not processed because the run was cancelled first
    Skipped,
    /// Error occurred; recorded on the task
    Failed,
}

impl FileState {
    /// Returns true if this state is terminal (no further changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileState::Done | FileState::Skipped | FileState::Failed)
    }
}

/// The state of an entire batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not yet started
    Pending,
    /// Currently executing
    Running,
    /// All files handled (some may have failed)
    Completed,
}

/// Aggregated result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Files matched by the mask
    pub total_files: usize,

    /// Files transformed successfully
    pub done_count: usize,

    /// Files left unprocessed by cancellation
    pub skipped_count: usize,

    /// Files that hit a recorded error
    pub failed_count: usize,

    /// Files written under a countered name
    pub renamed_count: usize,

    /// Bytes transformed across the run
    pub total_bytes_processed: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// True if the run stopped early on a cancel request
    pub cancelled: bool,

    /// Name and message for every failed file
    pub failed_files: Vec<FailedFile>,
}

/// One failed file in the summary.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub message: String,
}
