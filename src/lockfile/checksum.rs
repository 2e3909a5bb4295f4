//! Integrity digests for installed artifacts.

use sha2::{Digest, Sha256};

/// SHA-256 digest of `content` in the lockfile's `sha256:<hex>` format.
#[must_use]
pub fn compute_integrity(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
