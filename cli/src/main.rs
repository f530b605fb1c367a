//! xorbatch - Command-line interface for the batch XOR transform engine.
//!
//! Parses arguments, decodes the hex key, runs the batch on a worker thread
//! while rendering progress, and prints the summary as text or JSON. With
//! `--repeat` the batch is re-run on a fixed interval until interrupted.

mod progress;
mod worker;

use clap::Parser;
use engine::{
    create_batch, plan_batch, BatchConfig, BatchSummary, CancelFlag, ChecksumAlgorithm,
    CollisionPolicy, SourceDisposal, XorKey,
};
use log::LevelFilter;
use progress::{format_bytes, format_duration, ProgressRenderer};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// xorbatch - batch-transform files with a repeating-key XOR cipher
#[derive(Parser, Debug)]
#[command(name = "xorbatch")]
#[command(version = "0.1.0")]
#[command(about = "Batch-transform files with a repeating-key XOR cipher")]
struct Args {
    /// Input directory
    #[arg(long, value_name = "DIR")]
    input: PathBuf,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Glob mask applied to input file names
    #[arg(long, value_name = "GLOB", default_value = "*")]
    mask: String,

    /// Hex-encoded XOR key, e.g. deadbeef
    #[arg(long, value_name = "HEX")]
    key: String,

    /// Overwrite colliding output files instead of countered renaming
    #[arg(long)]
    overwrite: bool,

    /// Delete each input file after it is fully processed
    #[arg(long)]
    delete_input: bool,

    /// Verify that each destination restores to its source
    #[arg(long)]
    verify: bool,

    /// Checksum algorithm for verification: crc32, md5, sha256, blake3
    #[arg(long, value_name = "ALGORITHM", default_value = "sha256", requires = "verify")]
    hash: String,

    /// Re-run the batch every N seconds until interrupted
    #[arg(long, value_name = "SECONDS")]
    repeat: Option<u64>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let exit_code = match run_cli(&args) {
        Ok(code) => code,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<i32, String> {
    let config = build_config(args)?;

    loop {
        let summary = run_once(config.clone(), args)?;
        report_summary(&summary, args)?;

        let exit_code = if summary.failed_count > 0 { 1 } else { 0 };

        match args.repeat {
            Some(seconds) => {
                log::debug!("next run in {} second(s)", seconds);
                thread::sleep(Duration::from_secs(seconds));
            }
            None => return Ok(exit_code),
        }
    }
}

fn build_config(args: &Args) -> Result<BatchConfig, String> {
    let key = XorKey::from_hex(&args.key).map_err(|e| e.to_string())?;

    let mut config = BatchConfig::new(args.input.clone(), args.output.clone(), key);
    config.file_mask = args.mask.clone();
    config.collision_policy = if args.overwrite {
        CollisionPolicy::Overwrite
    } else {
        CollisionPolicy::RenameWithCounter
    };
    config.source_disposal = if args.delete_input {
        SourceDisposal::Delete
    } else {
        SourceDisposal::Keep
    };

    if args.verify {
        let algorithm = ChecksumAlgorithm::parse(&args.hash).ok_or_else(|| {
            format!(
                "Invalid hash algorithm '{}'. Must be 'crc32', 'md5', 'sha256', or 'blake3'",
                args.hash
            )
        })?;
        config.verify_after_process = true;
        config.checksum_algorithm = Some(algorithm);
    }

    Ok(config)
}

/// One full batch pass: validate, plan, run on a worker thread, drain events.
fn run_once(config: BatchConfig, args: &Args) -> Result<BatchSummary, String> {
    let mut job = create_batch(config).map_err(|e| format!("Batch creation failed: {}", e))?;
    plan_batch(&mut job).map_err(|e| format!("Batch planning failed: {}", e))?;

    let cancel = CancelFlag::new();
    let (events, handle) = worker::spawn_batch(job, cancel);

    let renderer = ProgressRenderer::new(args.verbose);
    for event in events {
        renderer.handle(&event);
    }

    match handle.join() {
        Ok(result) => result.map_err(|e| format!("Batch execution failed: {}", e)),
        Err(_) => Err("worker thread panicked".to_string()),
    }
}

fn report_summary(summary: &BatchSummary, args: &Args) -> Result<(), String> {
    if args.json {
        let text = serde_json::to_string_pretty(summary)
            .map_err(|e| format!("Failed to serialize summary: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    eprintln!(
        "Summary: {} done, {} skipped, {} failed, {} renamed",
        summary.done_count, summary.skipped_count, summary.failed_count, summary.renamed_count
    );
    if summary.cancelled {
        eprintln!("Run was cancelled before completion");
    }
    eprintln!("Bytes processed: {}", format_bytes(summary.total_bytes_processed));
    eprintln!("Elapsed: {}", format_duration(summary.elapsed));

    if !summary.failed_files.is_empty() {
        eprintln!();
        eprintln!("Failed files:");
        for failed in &summary.failed_files {
            eprintln!("  {}: {}", failed.name, failed.message);
        }
    }

    Ok(())
}
