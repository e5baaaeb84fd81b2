use sha2::{Digest, Sha256};

/// Stable 64-bit fingerprint of a block's text.
///
/// Used for change detection only: equal text always hashes equal, and
/// collisions across unrelated texts are rare enough to treat a matching
/// hash as "unchanged" for cache validity.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
