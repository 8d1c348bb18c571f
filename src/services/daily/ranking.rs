//! Seeded ordering of corpus keys.
//!
//! Every key gets a score derived from SHA-256 over the little-endian seed
//! bytes followed by the key's UTF-8 bytes. Keys are sorted by score, then
//! by key, and the first `count` are chosen. The ordering depends only on
//! the seed and the set of keys, so any process on any machine reproduces
//! it bit for bit.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Computes the ranking score of `key` under `seed`.
///
/// The score is the first eight digest bytes read as a big-endian `u64`.
#[must_use]
pub fn rank_score(seed: u64, key: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Chooses up to `count` distinct keys in seeded order.
///
/// Duplicate keys in the input are considered once. Input order has no
/// effect on the result.
#[must_use]
pub fn select_keys(seed: u64, keys: &[String], count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(u64, &str)> = keys
        .iter()
        .map(String::as_str)
        .filter(|key| seen.insert(*key))
        .map(|key| (rank_score(seed, key), key))
        .collect();

    ranked.sort_unstable();
    ranked
        .into_iter()
        .take(count)
        .map(|(_, key)| key.to_string())
        .collect()
}
