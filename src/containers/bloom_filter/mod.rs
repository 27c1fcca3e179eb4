// Copyright (c) 2025 Reef Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Approximate set-membership with a configurable false-positive rate.
//!
//! The filter never reports a false negative; false positives are bounded
//! by the configured rate asymptotically. Mutation takes a write lock,
//! `contains` a read lock.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::RwLock;

mod config;
mod hash;

pub use config::BloomFilterConfig;

use hash::{FnvMultiHasher, MultiHasher};

/// A reader-writer-locked Bloom filter over `T: Hash`.
///
/// # Examples
///
/// ```
/// use reef::containers::{BloomFilter, BloomFilterConfig};
///
/// let filter = BloomFilter::with_config(
///     BloomFilterConfig::new()
///         .with_expected_items(10_000)
///         .with_false_positive_rate(0.01),
/// );
///
/// filter.add(&"hello");
/// assert!(filter.contains(&"hello"));
/// assert!(!filter.contains(&"absent"));
/// ```
pub struct BloomFilter<T: Hash> {
    config: BloomFilterConfig,

    /// Bit array packed into 64-bit words, guarded as a whole.
    bits: RwLock<Vec<u64>>,

    /// Total number of addressable bits (`m`).
    bit_count: u64,

    /// Number of derived positions per item (`k`).
    hash_count: usize,

    hasher: FnvMultiHasher<T>,

    _marker: PhantomData<T>,
}

impl<T: Hash> BloomFilter<T> {
    /// Creates a filter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BloomFilterConfig::default())
    }

    /// Creates a filter sized for `n` expected items at false-positive rate
    /// `p`.
    pub fn with_rate(n: usize, p: f64) -> Self {
        Self::with_config(
            BloomFilterConfig::new()
                .with_expected_items(n)
                .with_false_positive_rate(p),
        )
    }

    /// Creates a filter with the given configuration.
    pub fn with_config(config: BloomFilterConfig) -> Self {
        let bit_count = config.bit_count();
        let hash_count = config.hash_count();
        let words = ((bit_count + 63) / 64) as usize;

        Self {
            config,
            bits: RwLock::new(vec![0u64; words]),
            bit_count,
            hash_count,
            hasher: FnvMultiHasher::new(),
            _marker: PhantomData,
        }
    }

    /// Records `value` in the filter, setting `k` bits under the write
    /// lock.
    pub fn add(&self, value: &T) {
        let positions = self
            .hasher
            .compute_positions(value, self.hash_count, self.bit_count);

        let mut bits = self.bits.write().expect("bloom filter lock poisoned");
        for pos in positions {
            let word = (pos / 64) as usize;
            bits[word] |= 1u64 << (pos % 64);
        }
    }

    /// Returns true if `value` might have been added; false means it
    /// definitely was not.
    pub fn contains(&self, value: &T) -> bool {
        let positions = self
            .hasher
            .compute_positions(value, self.hash_count, self.bit_count);

        let bits = self.bits.read().expect("bloom filter lock poisoned");
        positions.into_iter().all(|pos| {
            let word = (pos / 64) as usize;
            bits[word] & (1u64 << (pos % 64)) != 0
        })
    }

    /// Clears every bit, returning the filter to its empty state.
    pub fn reset(&self) {
        let mut bits = self.bits.write().expect("bloom filter lock poisoned");
        for word in bits.iter_mut() {
            *word = 0;
        }
    }

    /// Fraction of bits currently set, between 0.0 and 1.0.
    pub fn fill_ratio(&self) -> f64 {
        let bits = self.bits.read().expect("bloom filter lock poisoned");
        let set: u64 = bits.iter().map(|w| u64::from(w.count_ones())).sum();
        set as f64 / self.bit_count as f64
    }

    /// Returns the sizing configuration.
    pub fn config(&self) -> &BloomFilterConfig {
        &self.config
    }
}

impl<T: Hash> Default for BloomFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}
