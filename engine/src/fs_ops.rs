//! Filesystem operations module.
//!
//! This module provides the low-level operations behind a batch run:
//! - Flat enumeration of an input directory filtered by a glob mask
//! - The streaming read-XOR-write loop for one file
//! - Source deletion for move-style runs

use crate::error::EngineError;
use crate::xor::XorKey;
use glob::Pattern;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Chunk size for the streaming transform. 4 KiB, a typical virtual memory
/// page; the last chunk of a file may be shorter.
pub const CHUNK_SIZE: usize = 4096;

/// List the regular files in `dir` whose name matches `mask`, with sizes.
///
/// Non-recursive: subdirectories are not descended into and never appear in
/// the result. Entries whose names are not valid UTF-8 cannot match a mask
/// and are skipped. The result is sorted by file name so runs are
/// deterministic regardless of the platform's directory ordering.
pub fn list_matching_files(
    dir: &Path,
    mask: &Pattern,
) -> Result<Vec<(PathBuf, u64)>, EngineError> {
    let entries = fs::read_dir(dir).map_err(|e| EngineError::EnumerationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut matches = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let metadata = entry.metadata().map_err(|e| EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if !metadata.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if mask.matches(name) {
            matches.push((entry.path(), metadata.len()));
        }
    }

    matches.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    Ok(matches)
}

/// Transform `src` into `dst` through `key`, streaming in `CHUNK_SIZE`
/// chunks.
///
/// The destination is created with truncate semantics. The key offset is
/// carried across chunks, so the output equals a single whole-file XOR pass.
/// The source's modification time is propagated to the destination on a
/// best-effort basis.
///
/// # Returns
/// Number of bytes transformed
pub fn transform_file(src: &Path, dst: &Path, key: &XorKey) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_metadata = src_file.metadata().map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;
    let src_mtime = src_metadata.modified().ok();

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut stream_offset: u64 = 0;

    loop {
        let n = src_file.read(&mut buffer).map_err(|e| EngineError::ReadError {
            path: src.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }

        key.apply_in_place(&mut buffer[..n], stream_offset);
        dst_file
            .write_all(&buffer[..n])
            .map_err(|e| EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            })?;
        stream_offset += n as u64;
    }

    dst_file.flush().map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    // Close both handles before touching timestamps (and before any caller
    // deletes the source).
    drop(dst_file);
    drop(src_file);

    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(stream_offset)
}

/// Remove a fully processed source file.
pub fn delete_source(path: &Path) -> Result<(), EngineError> {
    fs::remove_file(path).map_err(|e| EngineError::DeleteError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_applies_mask() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("a.bin"), b"1").expect("Failed to write");
        fs::write(temp_dir.path().join("b.bin"), b"22").expect("Failed to write");
        fs::write(temp_dir.path().join("c.txt"), b"333").expect("Failed to write");

        let mask = Pattern::new("*.bin").unwrap();
        let files = list_matching_files(temp_dir.path(), &mask).expect("Failed to list");

        assert_eq!(files.len(), 2);
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
        assert_eq!(files[0].1, 1);
        assert_eq!(files[1].1, 2);
    }

    #[test]
    fn test_list_is_sorted_by_name() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        for name in ["zeta.bin", "alpha.bin", "mid.bin"] {
            fs::write(temp_dir.path().join(name), b"x").expect("Failed to write");
        }

        let mask = Pattern::new("*").unwrap();
        let files = list_matching_files(temp_dir.path(), &mask).expect("Failed to list");
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha.bin", "mid.bin", "zeta.bin"]);
    }

    #[test]
    fn test_list_excludes_subdirectories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("nested.bin")).expect("Failed to create dir");
        fs::write(temp_dir.path().join("nested.bin").join("inner.bin"), b"x")
            .expect("Failed to write");
        fs::write(temp_dir.path().join("flat.bin"), b"y").expect("Failed to write");

        let mask = Pattern::new("*.bin").unwrap();
        let files = list_matching_files(temp_dir.path(), &mask).expect("Failed to list");
        assert_eq!(files.len(), 1);
        assert!(files[0].0.ends_with("flat.bin"));
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let gone = temp_dir.path().join("nope");
        let mask = Pattern::new("*").unwrap();
        assert!(matches!(
            list_matching_files(&gone, &mask),
            Err(EngineError::EnumerationFailed { .. })
        ));
    }

    #[test]
    fn test_transform_round_trip_across_chunks() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("plain.bin");
        let mid = temp_dir.path().join("scrambled.bin");
        let back = temp_dir.path().join("restored.bin");

        // Longer than two chunks, and a key length that does not divide the
        // chunk size, to exercise the carried offset.
        let payload: Vec<u8> = (0u32..10_000).map(|i| (i * 31 % 256) as u8).collect();
        fs::write(&src, &payload).expect("Failed to write source");

        let key = XorKey::new(vec![0x13, 0x37, 0x9a]).unwrap();

        let bytes = transform_file(&src, &mid, &key).expect("Failed to transform");
        assert_eq!(bytes, payload.len() as u64);

        let scrambled = fs::read(&mid).expect("Failed to read scrambled");
        assert_eq!(scrambled, key.apply(&payload));

        let bytes = transform_file(&mid, &back, &key).expect("Failed to restore");
        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(fs::read(&back).expect("Failed to read restored"), payload);
    }

    #[test]
    fn test_transform_empty_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("empty.bin");
        let dst = temp_dir.path().join("out.bin");
        fs::write(&src, b"").expect("Failed to write");

        let key = XorKey::new(vec![0xff]).unwrap();
        let bytes = transform_file(&src, &dst, &key).expect("Failed to transform");
        assert_eq!(bytes, 0);
        assert_eq!(fs::read(&dst).expect("Failed to read").len(), 0);
    }

    #[test]
    fn test_transform_truncates_existing_destination() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("small.bin");
        let dst = temp_dir.path().join("dest.bin");
        fs::write(&src, b"ab").expect("Failed to write");
        fs::write(&dst, b"previous longer contents").expect("Failed to write");

        let key = XorKey::new(vec![0x00]).unwrap();
        transform_file(&src, &dst, &key).expect("Failed to transform");
        assert_eq!(fs::read(&dst).expect("Failed to read"), b"ab");
    }

    #[test]
    fn test_transform_missing_source_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let key = XorKey::new(vec![1]).unwrap();
        let result = transform_file(
            &temp_dir.path().join("absent.bin"),
            &temp_dir.path().join("out.bin"),
            &key,
        );
        assert!(matches!(result, Err(EngineError::ReadError { .. })));
    }

    #[test]
    fn test_delete_source() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("doomed.bin");
        fs::write(&path, b"x").expect("Failed to write");

        delete_source(&path).expect("Failed to delete");
        assert!(!path.exists());

        assert!(matches!(
            delete_source(&path),
            Err(EngineError::DeleteError { .. })
        ));
    }
}
