//! Checksum support for post-run verification.
//!
//! Because the XOR transform is involutive, a correctly written destination
//! file, read back through the same key, hashes to the same value as the
//! source. `verify_task` exploits that: it never needs to buffer either
//! file, only to stream both through a hasher.

use crate::error::EngineError;
use crate::model::FileTask;
use crate::xor::XorKey;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// CRC32 (fast, 32-bit)
    Crc32,
    /// MD5 (deprecated, but included for compatibility)
    Md5,
    /// SHA-256 (cryptographic, 256-bit)
    Sha256,
    /// BLAKE3 (modern, fast, 256-bit)
    Blake3,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32 => write!(f, "crc32"),
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl ChecksumAlgorithm {
    /// Parse algorithm from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "crc32" => Some(Self::Crc32),
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// A computed checksum value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumValue {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ChecksumValue {
    pub fn new(algorithm: ChecksumAlgorithm, hex: String) -> Self {
        ChecksumValue { algorithm, hex }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ChecksumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

/// Incremental hasher behind a common interface
trait ChecksumHasher {
    /// Feed a chunk into the hasher
    fn update(&mut self, data: &[u8]);

    /// Finish and produce the digest
    fn finalize(self: Box<Self>) -> ChecksumValue;
}

/// CRC32 hasher (polynomial 0xEDB88320, standard init/final xor)
struct Crc32Hasher {
    crc: u32,
}

impl Crc32Hasher {
    fn new() -> Self {
        Crc32Hasher { crc: 0xffff_ffff }
    }
}

impl ChecksumHasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xedb8_8320
                } else {
                    crc >> 1
                };
            }
        }
        self.crc = crc;
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        ChecksumValue::new(
            ChecksumAlgorithm::Crc32,
            format!("{:08x}", self.crc ^ 0xffff_ffff),
        )
    }
}

/// MD5 hasher (backed by md5 crate)
struct Md5Hasher {
    context: md5::Context,
}

impl Md5Hasher {
    fn new() -> Self {
        Md5Hasher {
            context: md5::Context::new(),
        }
    }
}

impl ChecksumHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        let digest = self.context.compute();
        ChecksumValue::new(ChecksumAlgorithm::Md5, format!("{:x}", digest))
    }
}

/// SHA-256 hasher (backed by sha2 crate)
struct Sha256Hasher {
    hasher: sha2::Sha256,
}

impl Sha256Hasher {
    fn new() -> Self {
        Sha256Hasher {
            hasher: sha2::Sha256::default(),
        }
    }
}

impl ChecksumHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        use sha2::Digest;
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Sha256, format!("{:x}", digest))
    }
}

/// BLAKE3 hasher (backed by blake3 crate)
struct Blake3Hasher {
    hasher: blake3::Hasher,
}

impl Blake3Hasher {
    fn new() -> Self {
        Blake3Hasher {
            hasher: blake3::Hasher::new(),
        }
    }
}

impl ChecksumHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Blake3, digest.to_hex().to_string())
    }
}

fn create_hasher(algorithm: ChecksumAlgorithm) -> Box<dyn ChecksumHasher> {
    match algorithm {
        ChecksumAlgorithm::Crc32 => Box::new(Crc32Hasher::new()),
        ChecksumAlgorithm::Md5 => Box::new(Md5Hasher::new()),
        ChecksumAlgorithm::Sha256 => Box::new(Sha256Hasher::new()),
        ChecksumAlgorithm::Blake3 => Box::new(Blake3Hasher::new()),
    }
}

const HASH_BUF_SIZE: usize = 65536;

/// Compute the checksum of a file's bytes as stored on disk.
pub fn compute_file_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumValue, EngineError> {
    stream_checksum(path, algorithm, None)
}

/// Compute the checksum of a file as it would read after one more XOR pass
/// with `key`.
///
/// For a destination produced by `key`, this equals the checksum of the
/// original source (involution).
pub fn compute_transformed_checksum(
    path: &Path,
    key: &XorKey,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumValue, EngineError> {
    stream_checksum(path, algorithm, Some(key))
}

fn stream_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
    key: Option<&XorKey>,
) -> Result<ChecksumValue, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = create_hasher(algorithm);
    let mut buffer = [0u8; HASH_BUF_SIZE];
    let mut offset: u64 = 0;

    loop {
        let n = file.read(&mut buffer).map_err(|e| EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        if let Some(key) = key {
            key.apply_in_place(&mut buffer[..n], offset);
        }
        hasher.update(&buffer[..n]);
        offset += n as u64;
    }

    Ok(hasher.finalize())
}

/// Verify a processed task: the destination, XOR-ed back through the key,
/// must hash to the same value as the source.
///
/// Records both checksums and the verdict on the task. Returns whether the
/// checksums matched. The task must still have its source present (callers
/// verify before any source deletion).
pub fn verify_task(
    task: &mut FileTask,
    key: &XorKey,
    algorithm: ChecksumAlgorithm,
) -> Result<bool, EngineError> {
    let destination = task
        .resolved_path
        .clone()
        .ok_or_else(|| EngineError::InvalidState {
            reason: "cannot verify a task without a resolved destination".to_string(),
        })?;

    let source_checksum = compute_file_checksum(&task.source_path, algorithm)?;
    let restored_checksum = compute_transformed_checksum(&destination, key, algorithm)?;

    let matches = source_checksum == restored_checksum;
    task.source_checksum = Some(source_checksum);
    task.restored_checksum = Some(restored_checksum);
    task.verification_passed = Some(matches);

    Ok(matches)
}
