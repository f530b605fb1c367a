//! Batch lifecycle: create, plan, run.
//!
//! A run moves through three phases:
//! - `create_batch` validates the configuration and returns a Pending job;
//!   every fatal configuration error surfaces here, before any side effect.
//! - `plan_batch` enumerates the matching input files and builds one task
//!   per match.
//! - `run_batch` executes the tasks in order on the calling thread,
//!   isolating per-file errors, reporting progress after every handled file,
//!   and honoring cancellation between files.

use crate::checksums;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{
    BatchConfig, BatchJob, BatchSummary, CollisionPolicy, FailedFile, FileState, FileTask,
    JobState, SourceDisposal,
};
use crate::naming;
use crate::progress::{CancelFlag, ProgressCallback};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Create a new batch job from a validated configuration.
///
/// Checks that both directories exist and are directories, and that the file
/// mask parses as a glob. The key is non-empty by `XorKey` construction.
///
/// # Errors
/// Returns a configuration `EngineError`; nothing on disk is touched.
pub fn create_batch(config: BatchConfig) -> Result<BatchJob, EngineError> {
    match fs::metadata(&config.input_dir) {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(EngineError::InputNotADirectory {
                    path: config.input_dir.clone(),
                });
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::InputDirNotFound {
                path: config.input_dir.clone(),
            });
        }
        Err(e) => {
            return Err(EngineError::InputDirAccessDenied {
                path: config.input_dir.clone(),
                source: e,
            });
        }
    }

    match fs::metadata(&config.output_dir) {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(EngineError::OutputNotADirectory {
                    path: config.output_dir.clone(),
                });
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::OutputDirNotFound {
                path: config.output_dir.clone(),
            });
        }
        Err(e) => {
            return Err(EngineError::OutputDirAccessDenied {
                path: config.output_dir.clone(),
                source: e,
            });
        }
    }

    Pattern::new(&config.file_mask).map_err(|e| EngineError::InvalidMask {
        mask: config.file_mask.clone(),
        reason: format!("{} at position {}", e.msg, e.pos),
    })?;

    Ok(BatchJob {
        id: Uuid::new_v4(),
        config,
        files: Vec::new(),
        state: JobState::Pending,
        total_bytes_to_process: 0,
        total_bytes_processed: 0,
        current_file_index: None,
        created_at: SystemTime::now(),
        start_time: None,
        end_time: None,
    })
}

/// Plan a job by enumerating the input directory.
///
/// Populates `job.files` with one Pending task per matched file, in file
/// name order, and computes the byte total. Matching zero files is a valid
/// plan. Candidate destinations keep the input file name unchanged.
///
/// # Errors
/// Returns `EnumerationFailed` if the input directory cannot be listed.
pub fn plan_batch(job: &mut BatchJob) -> Result<(), EngineError> {
    if job.state != JobState::Pending {
        return Err(EngineError::InvalidState {
            reason: format!(
                "batch must be Pending to plan; current state: {:?}",
                job.state
            ),
        });
    }

    let mask = Pattern::new(&job.config.file_mask).map_err(|e| EngineError::InvalidMask {
        mask: job.config.file_mask.clone(),
        reason: format!("{} at position {}", e.msg, e.pos),
    })?;

    let matches = fs_ops::list_matching_files(&job.config.input_dir, &mask)?;

    job.files = matches
        .into_iter()
        .filter_map(|(path, size)| {
            let file_name = path.file_name()?.to_owned();
            let proposed = job.config.output_dir.join(file_name);
            Some(FileTask::new(path, proposed, size))
        })
        .collect();

    job.total_bytes_to_process = job.files.iter().map(|f| f.file_size).sum();

    log::debug!(
        "batch {} planned: {} file(s), {} byte(s) matching '{}'",
        job.id,
        job.files.len(),
        job.total_bytes_to_process,
        job.config.file_mask
    );

    Ok(())
}

/// Run a planned job on the calling thread.
///
/// Per task, in planned order: resolve the destination (countered rename on
/// collision unless overwriting), stream-transform source to destination,
/// optionally verify, optionally delete the source. A task that fails is
/// recorded and the run continues with the next one. After every handled
/// task the callback receives `floor(completed / total * 100)`; a run with
/// zero matched files reports a single 100.
///
/// The cancel flag is consulted between tasks only. On cancellation the
/// remaining tasks become Skipped and no final 100 is synthesized.
///
/// # Errors
/// Returns `EngineError` only for job-level problems (wrong state). Per-file
/// errors land on the tasks and in the summary.
pub fn run_batch(
    job: &mut BatchJob,
    progress: Option<&dyn ProgressCallback>,
    cancel: Option<&CancelFlag>,
) -> Result<BatchSummary, EngineError> {
    if job.state != JobState::Pending {
        return Err(EngineError::InvalidState {
            reason: format!(
                "batch must be Pending to run; current state: {:?}",
                job.state
            ),
        });
    }

    job.state = JobState::Running;
    job.start_time = Some(SystemTime::now());
    log::debug!("batch {} started: {} file(s)", job.id, job.files.len());

    if let Some(callback) = progress {
        callback.on_batch_started(job);
    }

    // Cloned out of the job so per-task mutation below does not conflict
    // with borrowing the whole job for callbacks.
    let key = job.config.key.clone();
    let output_dir = job.config.output_dir.clone();
    let collision_policy = job.config.collision_policy;
    let source_disposal = job.config.source_disposal;
    let verify = job.config.verify_after_process;
    let algorithm = job.config.checksum_algorithm;

    let total = job.files.len();
    let mut completed = 0usize;
    let mut cancelled = false;

    if total == 0 {
        // Nothing matched: the run is already complete.
        if let Some(callback) = progress {
            callback.on_progress(job, 100);
        }
    }

    for index in 0..total {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            cancelled = true;
            for task in &mut job.files[index..] {
                task.state = FileState::Skipped;
            }
            log::debug!("batch {} cancelled before file index {}", job.id, index);
            break;
        }

        job.current_file_index = Some(index);
        job.files[index].state = FileState::Processing;

        if let Some(callback) = progress {
            callback.on_file_started(job, index, &job.files[index]);
        }

        let src_path = job.files[index].source_path.clone();
        let proposed = job.files[index].proposed_path.clone();

        match resolve_destination(&output_dir, &proposed, collision_policy) {
            Ok((dst_path, renamed)) => {
                job.files[index].renamed = renamed;
                job.files[index].resolved_path = Some(dst_path.clone());
                if renamed {
                    log::debug!(
                        "{}: destination taken, writing {}",
                        job.files[index].source_name(),
                        dst_path.display()
                    );
                }

                match fs_ops::transform_file(&src_path, &dst_path, &key) {
                    Ok(bytes) => {
                        job.files[index].bytes_processed = bytes;
                        job.total_bytes_processed += bytes;
                        job.files[index].state = FileState::Done;

                        if verify {
                            if let Some(algorithm) = algorithm {
                                match checksums::verify_task(&mut job.files[index], &key, algorithm)
                                {
                                    Ok(true) => {}
                                    Ok(false) => {
                                        log::warn!(
                                            "{}: verification mismatch",
                                            job.files[index].source_name()
                                        );
                                        job.files[index].state = FileState::Failed;
                                        job.files[index].error_message = Some(
                                            "transformed output does not restore to the source"
                                                .to_string(),
                                        );
                                    }
                                    Err(e) => record_failure(&mut job.files[index], &e),
                                }
                            }
                        }

                        // The source is only removed once the destination is
                        // fully written, closed, and (if enabled) verified.
                        if job.files[index].state == FileState::Done
                            && source_disposal == SourceDisposal::Delete
                        {
                            if let Err(e) = fs_ops::delete_source(&src_path) {
                                record_failure(&mut job.files[index], &e);
                            }
                        }
                    }
                    Err(e) => record_failure(&mut job.files[index], &e),
                }
            }
            Err(e) => record_failure(&mut job.files[index], &e),
        }

        completed += 1;
        if let Some(callback) = progress {
            callback.on_file_completed(job, index, &job.files[index]);
            callback.on_progress(job, percent_complete(completed, total));
        }
    }

    job.state = JobState::Completed;
    job.end_time = Some(SystemTime::now());
    job.current_file_index = None;

    if let Some(callback) = progress {
        callback.on_batch_completed(job);
    }

    let summary = summarize(job, cancelled);
    log::debug!(
        "batch {} finished: {} done, {} skipped, {} failed",
        job.id,
        summary.done_count,
        summary.skipped_count,
        summary.failed_count
    );
    Ok(summary)
}

/// Pick the destination path for a task.
///
/// The candidate passes through untouched when nothing sits at that path
/// (whatever the policy), or when the policy is overwrite. Otherwise the
/// existing file's name seeds the countered-name scan. The bool is true
/// when a countered name was chosen.
fn resolve_destination(
    output_dir: &Path,
    proposed: &Path,
    policy: CollisionPolicy,
) -> Result<(PathBuf, bool), EngineError> {
    if !proposed.exists() || policy == CollisionPolicy::Overwrite {
        return Ok((proposed.to_path_buf(), false));
    }

    let seed = match proposed.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        // Planned tasks always carry UTF-8 file names; nothing to rename.
        None => return Ok((proposed.to_path_buf(), false)),
    };

    let countered = naming::next_countered_name(output_dir, seed)?;
    Ok((output_dir.join(countered), true))
}

fn record_failure(task: &mut FileTask, error: &EngineError) {
    log::warn!("{}: {}", task.source_name(), error);
    task.state = FileState::Failed;
    task.error_code = error.raw_os_error();
    task.error_message = Some(error.to_string());
}

fn percent_complete(completed: usize, total: usize) -> u8 {
    ((completed * 100) / total) as u8
}

fn summarize(job: &BatchJob, cancelled: bool) -> BatchSummary {
    let mut done_count = 0;
    let mut skipped_count = 0;
    let mut failed_count = 0;
    let mut renamed_count = 0;
    let mut failed_files = Vec::new();

    for task in &job.files {
        if task.renamed {
            renamed_count += 1;
        }
        match task.state {
            FileState::Done => done_count += 1,
            FileState::Skipped => skipped_count += 1,
            FileState::Failed => {
                failed_count += 1;
                failed_files.push(FailedFile {
                    name: task.source_name(),
                    message: task
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "unknown error".to_string()),
                });
            }
            _ => {}
        }
    }

    let elapsed = match (job.start_time, job.end_time) {
        (Some(start), Some(end)) => end.duration_since(start).unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    };

    BatchSummary {
        total_files: job.files.len(),
        done_count,
        skipped_count,
        failed_count,
        renamed_count,
        total_bytes_processed: job.total_bytes_processed,
        elapsed,
        cancelled,
        failed_files,
    }
}
