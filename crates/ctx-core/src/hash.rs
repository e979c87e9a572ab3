//! Content hashing for cache manifests.
//!
//! The cache manifest keys every tracked file by the SHA-256 of its bytes, so
//! "is the cache still valid" reduces to one hash comparison per path.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::CacheError;

/// Hex-encoded SHA-256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Hex-encoded SHA-256 of the file at `path`.
pub fn hash_file(path: &Path) -> Result<String, CacheError> {
    let bytes = std::fs::read(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(hash_bytes(&bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
