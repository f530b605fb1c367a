//! Repeating-key XOR transform.
//!
//! The cipher is symmetric and involutive: applying the same key twice
//! restores the original bytes. It is an obfuscation tool, not encryption.
//!
//! Chunked processing must produce the same bytes as one whole-buffer pass,
//! so every application takes the offset of the chunk within the logical
//! stream and indexes the key by `(stream_offset + i) % key_len`.

use crate::error::EngineError;

/// A validated, non-empty XOR key.
///
/// Construction is the only place the non-empty invariant is checked; every
/// transform may then index `bytes[pos % len]` without a zero-length guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorKey {
    bytes: Vec<u8>,
}

impl XorKey {
    /// Create a key from raw bytes. Rejects an empty buffer.
    pub fn new(bytes: Vec<u8>) -> Result<Self, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        Ok(XorKey { bytes })
    }

    /// Decode a key from a hex string, e.g. `"deadbeef"`.
    ///
    /// Rejects empty input, odd digit counts, and non-hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, EngineError> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        if !hex.is_ascii() {
            return Err(EngineError::InvalidHexKey {
                reason: "key contains non-ASCII characters".to_string(),
            });
        }
        if hex.len() % 2 != 0 {
            return Err(EngineError::InvalidHexKey {
                reason: format!("odd number of hex digits ({})", hex.len()),
            });
        }

        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for i in (0..hex.len()).step_by(2) {
            let pair = &hex[i..i + 2];
            let byte = u8::from_str_radix(pair, 16).map_err(|_| EngineError::InvalidHexKey {
                reason: format!("'{}' is not a hex byte", pair),
            })?;
            bytes.push(byte);
        }

        XorKey::new(bytes)
    }

    /// Key length in bytes. Always at least 1.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// XOR `buf` in place against the key.
    ///
    /// `stream_offset` is the position of `buf[0]` within the logical byte
    /// stream being transformed. Passing the running offset of each chunk
    /// makes chunked application byte-identical to a single whole-stream
    /// application. A zero-length `buf` is a no-op.
    pub fn apply_in_place(&self, buf: &mut [u8], stream_offset: u64) {
        let key = &self.bytes;
        let key_len = key.len() as u64;
        for (i, byte) in buf.iter_mut().enumerate() {
            let key_pos = (stream_offset + i as u64) % key_len;
            *byte ^= key[key_pos as usize];
        }
    }

    /// One-shot transform of a whole buffer, starting at stream offset 0.
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        let mut output = input.to_vec();
        self.apply_in_place(&mut output, 0);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(XorKey::new(Vec::new()), Err(EngineError::EmptyKey)));
    }

    #[test]
    fn test_from_hex_decodes_bytes() {
        let key = XorKey::from_hex("deadbeef").expect("valid hex");
        assert_eq!(key.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_from_hex_accepts_uppercase_and_whitespace() {
        let key = XorKey::from_hex("  0A1B  ").expect("valid hex");
        assert_eq!(key.as_bytes(), &[0x0a, 0x1b]);
    }

    #[test]
    fn test_from_hex_rejects_empty() {
        assert!(matches!(XorKey::from_hex(""), Err(EngineError::EmptyKey)));
        assert!(matches!(XorKey::from_hex("   "), Err(EngineError::EmptyKey)));
    }

    #[test]
    fn test_from_hex_rejects_odd_length() {
        assert!(matches!(
            XorKey::from_hex("abc"),
            Err(EngineError::InvalidHexKey { .. })
        ));
    }

    #[test]
    fn test_from_hex_rejects_non_hex_digits() {
        assert!(matches!(
            XorKey::from_hex("zz"),
            Err(EngineError::InvalidHexKey { .. })
        ));
    }

    #[test]
    fn test_xor_known_values() {
        // 0x00 ^ k == k, k ^ k == 0x00
        let key = XorKey::new(vec![0x5a]).unwrap();
        assert_eq!(key.apply(&[0x00, 0x5a, 0xff]), vec![0x5a, 0x00, 0xa5]);
    }

    #[test]
    fn test_involution_restores_input() {
        let key = XorKey::new(vec![0x13, 0x37, 0xc0]).unwrap();
        let input: Vec<u8> = (0u16..1000).map(|i| (i % 256) as u8).collect();

        let once = key.apply(&input);
        assert_ne!(once, input);
        let twice = key.apply(&once);
        assert_eq!(twice, input);
    }

    #[test]
    fn test_zero_length_input() {
        let key = XorKey::new(vec![0xaa]).unwrap();
        assert_eq!(key.apply(&[]), Vec::<u8>::new());

        let mut empty: [u8; 0] = [];
        key.apply_in_place(&mut empty, 12345);
    }

    #[test]
    fn test_chunked_equals_whole_buffer() {
        // 10 bytes against a 3-byte key, chunked 4+3+3: the carried stream
        // offset must line the key up exactly as a single pass would.
        let key = XorKey::new(vec![1, 2, 3]).unwrap();
        let input: Vec<u8> = (0u8..10).collect();

        let whole = key.apply(&input);

        let mut chunked = input.clone();
        let mut offset = 0u64;
        for chunk in [4usize, 3, 3] {
            let start = offset as usize;
            key.apply_in_place(&mut chunked[start..start + chunk], offset);
            offset += chunk as u64;
        }

        assert_eq!(chunked, whole);
    }

    #[test]
    fn test_arbitrary_chunk_splits_agree() {
        let key = XorKey::new(vec![0xde, 0xad, 0xbe, 0xef, 0x01]).unwrap();
        let input: Vec<u8> = (0u16..257).map(|i| (i * 7 % 256) as u8).collect();
        let whole = key.apply(&input);

        for split in [1usize, 2, 3, 5, 8, 64, 256] {
            let mut chunked = input.clone();
            let mut offset = 0usize;
            while offset < chunked.len() {
                let end = usize::min(offset + split, chunked.len());
                let (start, len) = (offset, end - offset);
                key.apply_in_place(&mut chunked[start..start + len], offset as u64);
                offset = end;
            }
            assert_eq!(chunked, whole, "chunk size {} diverged", split);
        }
    }

    #[test]
    fn test_offset_not_reset_per_chunk() {
        // Resetting the key index at a chunk boundary is the classic bug:
        // with a key whose length does not divide the chunk size, the two
        // schemes must disagree.
        let key = XorKey::new(vec![0x10, 0x20, 0x30]).unwrap();
        let input = [0u8; 8];

        let mut carried = input;
        key.apply_in_place(&mut carried[..4], 0);
        key.apply_in_place(&mut carried[4..], 4);

        let mut reset = input;
        key.apply_in_place(&mut reset[..4], 0);
        key.apply_in_place(&mut reset[4..], 0);

        assert_eq!(carried.to_vec(), key.apply(&input));
        assert_ne!(carried, reset);
    }
}
