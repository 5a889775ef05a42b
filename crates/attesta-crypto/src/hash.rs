// SHA-256 digest helpers

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `bytes` and returns it as a lowercase hex
/// string (64 characters).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
