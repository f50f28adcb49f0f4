//! Content hashing for deduplication and unique-name derivation.

use sha2::{Digest, Sha256};

/// Number of hex characters kept when a hash is embedded in a file name.
pub const SHORT_HASH_LEN: usize = 8;

/// Compute the SHA-256 hash of raw content bytes.
/// Returns the full hex-encoded digest (64 characters).
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Truncated hash prefix used in content-derived file names.
///
/// Deterministic for identical content regardless of processing order. Eight
/// hex characters can in principle collide for distinct content; that case is
/// accepted and not detected.
pub fn short_hash(bytes: &[u8]) -> String {
    content_hash(bytes)[..SHORT_HASH_LEN].to_string()
}
