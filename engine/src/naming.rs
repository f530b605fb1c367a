//! Countered file name generation.
//!
//! When a destination name is taken and overwriting is off, the batch writes
//! to the next free name of the form `base (N).ext`. The next counter is
//! `max(N) + 1` over the sibling files already carrying one, or 1 when none
//! do. Matching is an explicit parse (prefix/suffix split plus a digits-only
//! check) rather than a regex, so `report (abc).txt` or `report (1) (2).txt`
//! are simply ignored.
//!
//! The proposed name is not reserved: the caller must create the file
//! promptly. Two concurrent calls over the same directory can both receive
//! the same name; the engine avoids that by running batches on one worker.

use crate::error::EngineError;
use std::fs;
use std::path::Path;

/// Propose the next free countered name for `seed_name` in `directory`.
///
/// `seed_name` is a plain file name, not a path; the returned value is a
/// file name as well. The directory must exist; a failed scan is returned
/// as `NameScanFailed`, not treated as "no matches".
pub fn next_countered_name(directory: &Path, seed_name: &str) -> Result<String, EngineError> {
    let (base, extension) = split_base_extension(seed_name);

    let entries = fs::read_dir(directory).map_err(|e| EngineError::NameScanFailed {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut max_counter: u64 = 0;

    for entry in entries {
        let entry = entry.map_err(|e| EngineError::NameScanFailed {
            path: directory.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| EngineError::NameScanFailed {
            path: directory.to_path_buf(),
            source: e,
        })?;
        if !file_type.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        if let Some(counter) = counter_value(file_name, base, extension) {
            max_counter = max_counter.max(counter);
        }
    }

    Ok(countered_name(base, extension, max_counter + 1))
}

/// Split a file name into the part before the final dot and the extension
/// after it. Names without a dot (and dot-initial names like `.gitignore`)
/// have no extension.
fn split_base_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Format `base (counter).ext`, or `base (counter)` for extension-less seeds.
fn countered_name(base: &str, extension: Option<&str>, counter: u64) -> String {
    match extension {
        Some(ext) => format!("{} ({}).{}", base, counter, ext),
        None => format!("{} ({})", base, counter),
    }
}

/// Parse the counter out of `file_name` if it is exactly
/// `{base} ({digits}).{extension}`. Anything else returns None.
fn counter_value(file_name: &str, base: &str, extension: Option<&str>) -> Option<u64> {
    let rest = file_name.strip_prefix(base)?.strip_prefix(" (")?;

    let with_paren = match extension {
        Some(ext) => rest.strip_suffix(ext)?.strip_suffix('.')?,
        None => rest,
    };
    let digits = with_paren.strip_suffix(')')?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}
