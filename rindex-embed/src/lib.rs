use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rindex_types::{ProjectionVector, Trit};
use tracing::debug;
use xxhash_rust::xxh64::{xxh64, Xxh64};

/// 64-bit hash of a pair-key.
pub fn key_hash(key: &str) -> u64 {
    xxh64(key.as_bytes(), 0)
}

/// Hash of `last` followed by `current`, without building the key string.
pub fn pair_hash(last: &str, current: &str) -> u64 {
    let mut hasher = Xxh64::new(0);
    hasher.update(last.as_bytes());
    hasher.update(current.as_bytes());
    hasher.digest()
}

/// Draw a ternary vector from a generator seeded with `hash`.
///
/// Each coordinate takes `r` uniform in `0..denominator`: `0` gives +1,
/// `1` gives -1, anything else 0.
pub fn derive_projection(hash: u64, dimension: usize, denominator: u32) -> ProjectionVector {
    let mut rng = ChaCha8Rng::seed_from_u64(hash);
    (0..dimension)
        .map(|_| match rng.gen_range(0..denominator) {
            0 => 1 as Trit,
            1 => -1,
            _ => 0,
        })
        .collect()
}

/// Memoized pair-key → projection vector mapping.
///
/// Entries are never evicted; the cache grows with the number of distinct
/// pair-keys seen during a run.
#[derive(Debug)]
pub struct ProjectionCache {
    dimension: usize,
    denominator: u32,
    entries: HashMap<u64, ProjectionVector>,
    hits: u64,
    misses: u64,
}

impl ProjectionCache {
    pub fn new(dimension: usize, denominator: u32) -> Self {
        debug!(dimension, denominator, "projection cache created");
        Self {
            dimension,
            denominator,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn lookup(&mut self, key: &str) -> &[Trit] {
        self.lookup_hash(key_hash(key))
    }

    /// Same as `lookup(&format!("{last}{current}"))`.
    pub fn lookup_pair(&mut self, last: &str, current: &str) -> &[Trit] {
        self.lookup_hash(pair_hash(last, current))
    }

    fn lookup_hash(&mut self, hash: u64) -> &[Trit] {
        let (dimension, denominator) = (self.dimension, self.denominator);
        if self.entries.contains_key(&hash) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries
            .entry(hash)
            .or_insert_with(|| derive_projection(hash, dimension, denominator))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
