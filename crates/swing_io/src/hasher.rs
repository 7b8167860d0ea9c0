//! crates/swing_io/src/hasher.rs
//!
//! SHA-256 digests for the run record. Hex output is lowercase.
//!
//! - `sha256_hex` / `sha256_file` hash **raw bytes** (the dataset exactly as read).
//! - `sha256_canonical` hashes a JSON value through canonical_json, so two
//!   semantically equal parameter sets hash the same regardless of key order.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_json_bytes;
use crate::IoResult;

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 over a reader stream (raw, not canonicalized).
pub fn sha256_stream<R: Read>(reader: &mut R) -> IoResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file(path: &Path) -> IoResult<String> {
    let mut r = BufReader::new(File::open(path)?);
    sha256_stream(&mut r)
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    let v = serde_json::to_value(value)?;
    Ok(sha256_hex(&to_canonical_json_bytes(&v)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn stream_matches_bytes() {
        let data = vec![7u8; 300_000];
        let mut cur = std::io::Cursor::new(data.clone());
        assert_eq!(sha256_stream(&mut cur).unwrap(), sha256_hex(&data));
    }

    #[test]
    fn canonical_hash_ignores_key_order() {
        let a = json!({"seed": 1, "iterations": 10});
        let b = json!({"iterations": 10, "seed": 1});
        assert_eq!(sha256_canonical(&a).unwrap(), sha256_canonical(&b).unwrap());
    }
}
