//! # XorBatch Engine - Batch File Transform Library
//!
//! A headless engine for batch-transforming files with a repeating-key XOR
//! cipher. Designed as the foundation for multiple front ends (CLI, GUI,
//! automation).
//!
//! ## Overview
//!
//! The engine reads every file matching a glob mask in an input directory,
//! streams it through the key, and writes the result into an output
//! directory. It features:
//! - Flat directory enumeration filtered by a glob mask
//! - Collision-safe output naming (`name (N).ext` counters) or overwrite
//! - Bounded-memory streaming (fixed 4 KiB chunks, offset carried across
//!   chunks so the cipher is chunking-agnostic)
//! - Per-file state tracking and error isolation
//! - Progress reporting via callbacks (decoupled from UI technology)
//! - Optional delete-after-processing and checksum verification
//!
//! The cipher is involutive: running the output through the same key
//! restores the input. It is an obfuscation tool, not encryption.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{create_batch, plan_batch, run_batch, BatchConfig, XorKey};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let key = XorKey::from_hex("deadbeef")?;
//! let mut config = BatchConfig::new("/data/in".into(), "/data/out".into(), key);
//! config.file_mask = "*.bin".to_string();
//!
//! let mut job = create_batch(config)?;
//! plan_batch(&mut job)?;
//! println!("Will process {} files", job.files.len());
//!
//! let summary = run_batch(&mut job, None, None)?;
//! println!("{} done, {} failed", summary.done_count, summary.failed_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (BatchJob, FileTask, enums)
//! - **error**: Error types and handling
//! - **xor**: The repeating-key XOR transform
//! - **naming**: Countered output-name generation
//! - **fs_ops**: Low-level filesystem operations
//! - **job**: Batch orchestration (create, plan, run)
//! - **progress**: Progress callback trait and cancellation
//! - **checksums**: Checksum computation for post-run verification

pub mod checksums;
pub mod error;
pub mod fs_ops;
pub mod job;
pub mod model;
pub mod naming;
pub mod progress;
pub mod xor;

// Re-export main types and functions
pub use checksums::{compute_file_checksum, compute_transformed_checksum, ChecksumAlgorithm, ChecksumValue};
pub use error::EngineError;
pub use job::{create_batch, plan_batch, run_batch};
pub use model::{
    BatchConfig, BatchJob, BatchSummary, CollisionPolicy, FailedFile, FileState, FileTask,
    JobState, SourceDisposal,
};
pub use naming::next_countered_name;
pub use progress::{CancelFlag, ProgressCallback};
pub use xor::XorKey;
