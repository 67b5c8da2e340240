//! Content hashing for uploaded proof images
//!
//! Images are deduplicated per session by the SHA-256 digest of their raw
//! bytes, hex-encoded in lowercase.

use sha2::{Digest, Sha256};

/// Calculate the lowercase hex SHA-256 digest of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}
