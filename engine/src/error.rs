//! Error types for the batch engine.
//!
//! The primary error type is `EngineError`. Configuration errors (bad
//! directories, an empty key, a malformed mask) are fatal and surface before
//! any file is touched. I/O errors during a run are per-file: they are
//! recorded on the owning `FileTask` and never abort the batch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the batch engine.
///
/// Variants up to `InvalidState` are configuration errors: they are returned
/// from `create_batch`/`plan_batch` before any side effect. The remaining
/// variants describe I/O failures; during `run_batch` those are converted to
/// a message plus OS error code on the affected `FileTask` instead of being
/// returned.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input directory does not exist
    #[error("input directory not found: {path}")]
    InputDirNotFound { path: PathBuf },

    /// Input path exists but is not a directory
    #[error("input path is not a directory: {path}")]
    InputNotADirectory { path: PathBuf },

    /// Input directory is not accessible (permissions)
    #[error("input directory access denied: {path}")]
    InputDirAccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output directory does not exist
    #[error("output directory not found: {path}")]
    OutputDirNotFound { path: PathBuf },

    /// Output path exists but is not a directory
    #[error("output path is not a directory: {path}")]
    OutputNotADirectory { path: PathBuf },

    /// Output directory is not accessible (permissions)
    #[error("output directory access denied: {path}")]
    OutputDirAccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The XOR key contained no bytes
    #[error("XOR key must contain at least one byte")]
    EmptyKey,

    /// The hex-encoded XOR key could not be decoded
    #[error("invalid hex key: {reason}")]
    InvalidHexKey { reason: String },

    /// The file mask is not a valid glob pattern
    #[error("invalid file mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },

    /// A lifecycle function was called on a job in the wrong state
    #[error("invalid job state: {reason}")]
    InvalidState { reason: String },

    /// Failed to enumerate the input directory
    #[error("failed to enumerate directory: {path}")]
    EnumerationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to scan the output directory for countered names
    #[error("failed to scan directory for countered names: {path}")]
    NameScanFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read from a source file
    #[error("failed to read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create or write a destination file
    #[error("failed to write file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to delete a source file after processing
    #[error("failed to delete source file: {path}")]
    DeleteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<u32> {
        match self {
            Self::InputDirAccessDenied { source, .. }
            | Self::OutputDirAccessDenied { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::NameScanFailed { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::DeleteError { source, .. } => source.raw_os_error().map(|e| e as u32),
            _ => None,
        }
    }

    /// True for errors that invalidate the whole run configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InputDirNotFound { .. }
                | Self::InputNotADirectory { .. }
                | Self::InputDirAccessDenied { .. }
                | Self::OutputDirNotFound { .. }
                | Self::OutputNotADirectory { .. }
                | Self::OutputDirAccessDenied { .. }
                | Self::EmptyKey
                | Self::InvalidHexKey { .. }
                | Self::InvalidMask { .. }
        )
    }
}
