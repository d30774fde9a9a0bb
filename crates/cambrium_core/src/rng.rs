//! Seeded, splittable pseudorandom source.
//!
//! Every random decision in the engine flows from a single [`Seed`] through
//! a Mulberry32-class generator. Independent sub-streams are keyed by a
//! purpose label: the stream seed is `seed ^ fnv1a(purpose)`, so a stream's
//! output never depends on how much any other stream has been consumed.
//!
//! The generator is built for reproducibility, not secrecy.

use crate::error::{GenesisError, Result};
use cambrium_data::BlockDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Root integer from which every stream in a generation context derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed(u32);

impl Seed {
    #[must_use]
    pub const fn from_nonce(nonce: u32) -> Self {
        Self(nonce)
    }

    #[must_use]
    pub fn from_block(block: &BlockDescriptor) -> Self {
        Self(block.nonce)
    }

    /// Folds a hex block hash into 32 bits by XOR over big-endian words.
    pub fn from_hash(hash: &str) -> Result<Self> {
        let trimmed = hash.trim().trim_start_matches("0x");
        if trimmed.is_empty() {
            return Err(GenesisError::invalid_input("block hash is empty"));
        }
        let bytes = hex::decode(trimmed)?;
        let folded = bytes.chunks(4).fold(0u32, |acc, chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            acc ^ u32::from_be_bytes(word)
        });
        Ok(Self(folded))
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// FNV-1a over the UTF-8 bytes of a purpose label.
#[must_use]
pub fn hash_purpose(purpose: &str) -> u32 {
    purpose
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Mulberry32 output permutation.
#[must_use]
pub fn mix32(state: u32) -> u32 {
    let mut t = state;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    t ^ (t >> 14)
}

/// Re-hash chain parameters: every `interval`-th output is retained, up to
/// `capacity` entries (oldest evicted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub interval: u32,
    pub capacity: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            interval: 10,
            capacity: 100,
        }
    }
}

/// Captures a seed, failing loudly when none was supplied.
pub fn derive(seed: Option<Seed>) -> Result<SeededGenerator> {
    seed.map(SeededGenerator::new)
        .ok_or(GenesisError::SeedUnavailable)
}

#[derive(Debug, Clone)]
pub struct SeededGenerator {
    seed: u32,
    state: u32,
    calls: u64,
    settings: ChainSettings,
    chain: VecDeque<u32>,
}

impl SeededGenerator {
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self::with_settings(seed, ChainSettings::default())
    }

    #[must_use]
    pub fn with_settings(seed: Seed, settings: ChainSettings) -> Self {
        Self {
            seed: seed.value(),
            state: seed.value(),
            calls: 0,
            settings,
            chain: VecDeque::with_capacity(settings.capacity),
        }
    }

    #[must_use]
    pub fn seed(&self) -> Seed {
        Seed(self.seed)
    }

    /// Number of raw outputs drawn so far.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Independent sub-generator keyed by `purpose`. Derived from the seed,
    /// not the current state, so it is unaffected by prior draws.
    #[must_use]
    pub fn stream(&self, purpose: &str) -> SeededGenerator {
        let derived = self.seed ^ hash_purpose(purpose);
        tracing::trace!(purpose, parent = self.seed, derived, "Derived purpose stream");
        SeededGenerator::with_settings(Seed(derived), self.settings)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let out = mix32(self.state);
        self.calls += 1;
        if self.settings.interval > 0
            && self.settings.capacity > 0
            && self.calls % u64::from(self.settings.interval) == 0
        {
            if self.chain.len() == self.settings.capacity {
                self.chain.pop_front();
            }
            self.chain.push_back(out);
        }
        out
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range without
    /// consuming output.
    pub fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len - 1)
    }

    /// Bernoulli trial with success probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Retained outputs, oldest first.
    #[must_use]
    pub fn rehash_chain(&self) -> &VecDeque<u32> {
        &self.chain
    }

    /// The `n`-th distinguishing value: a deterministic value derived from
    /// the re-hash chain without advancing the generator. `None` until the
    /// chain holds at least one entry.
    #[must_use]
    pub fn distinguishing_value(&self, n: usize) -> Option<u32> {
        if self.chain.is_empty() {
            return None;
        }
        let entry = self.chain[n % self.chain.len()];
        Some(mix32(entry ^ (n as u32).wrapping_mul(MULBERRY_INCREMENT)))
    }
}

impl rand::RngCore for SeededGenerator {
    fn next_u32(&mut self) -> u32 {
        SeededGenerator::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(SeededGenerator::next_u32(self));
        let lo = u64::from(SeededGenerator::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = SeededGenerator::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(gen: &mut SeededGenerator, n: usize) -> Vec<u32> {
        (0..n).map(|_| gen.next_u32()).collect()
    }

    #[test]
    fn test_known_sequence() {
        let mut gen = SeededGenerator::new(Seed::from_nonce(0));
        assert_eq!(sample(&mut gen, 3), vec![0x4434_B462, 0x0015_9C37, 0x3928_5B08]);

        let mut gen = SeededGenerator::new(Seed::from_nonce(0xCAFE_BABE));
        assert_eq!(sample(&mut gen, 3), vec![0x9406_E174, 0xFAB4_2233, 0xBDA7_1609]);
    }

    #[test]
    fn test_fnv_purpose_hash() {
        assert_eq!(hash_purpose(""), FNV_OFFSET);
        assert_eq!(hash_purpose("traits/visual"), 0x1451_E719);
    }

    #[test]
    fn test_missing_seed_is_an_error() {
        assert!(matches!(derive(None), Err(GenesisError::SeedUnavailable)));
        assert!(derive(Some(Seed::from_nonce(1))).is_ok());
    }

    #[test]
    fn test_reproducible() {
        let mut a = derive(Some(Seed::from_nonce(42))).unwrap();
        let mut b = derive(Some(Seed::from_nonce(42))).unwrap();
        assert_eq!(sample(&mut a, 256), sample(&mut b, 256));
    }

    #[test]
    fn test_stream_ignores_parent_state() {
        let root = SeededGenerator::new(Seed::from_nonce(7));
        let mut advanced = root.clone();
        sample(&mut advanced, 50);
        let mut s1 = root.stream("milestone");
        let mut s2 = advanced.stream("milestone");
        assert_eq!(sample(&mut s1, 16), sample(&mut s2, 16));
        assert_eq!(s1.seed().value(), 7 ^ hash_purpose("milestone"));
    }

    #[test]
    fn test_streams_uncorrelated() {
        let root = SeededGenerator::new(Seed::from_nonce(0xDEAD_BEEF));
        let mut a = root.stream("a");
        let mut b = root.stream("b");
        let n = 10_000;
        let xs: Vec<f64> = (0..n).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..n).map(|_| b.next_f64()).collect();
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let (mx, my) = (mean(&xs), mean(&ys));
        let cov: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
        let vx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
        let vy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
        let r = cov / (vx.sqrt() * vy.sqrt());
        assert!(r.abs() < 0.05, "correlation too high: {r}");
        assert!((mx - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_rehash_chain_records_every_tenth() {
        let mut gen = SeededGenerator::new(Seed::from_nonce(3));
        let outputs = sample(&mut gen, 30);
        let chain: Vec<u32> = gen.rehash_chain().iter().copied().collect();
        assert_eq!(chain, vec![outputs[9], outputs[19], outputs[29]]);
    }

    #[test]
    fn test_rehash_chain_is_bounded() {
        let mut gen = SeededGenerator::new(Seed::from_nonce(3));
        let outputs = sample(&mut gen, 2_000);
        let chain = gen.rehash_chain();
        assert_eq!(chain.len(), 100);
        assert_eq!(chain.front().copied(), Some(outputs[1_009]));
        assert_eq!(chain.back().copied(), Some(outputs[1_999]));
    }

    #[test]
    fn test_distinguishing_value_does_not_advance() {
        let mut gen = SeededGenerator::new(Seed::from_nonce(11));
        assert_eq!(gen.distinguishing_value(0), None);
        sample(&mut gen, 40);
        let calls = gen.calls();
        let first = gen.distinguishing_value(5);
        assert_eq!(first, gen.distinguishing_value(5));
        assert_ne!(gen.distinguishing_value(5), gen.distinguishing_value(6));
        assert_eq!(gen.calls(), calls);
    }

    #[test]
    fn test_float_range() {
        let mut gen = SeededGenerator::new(Seed::from_nonce(99));
        for _ in 0..5_000 {
            let f = gen.next_f64();
            assert!((0.0..1.0).contains(&f));
            let r = gen.range_f64(0.1, 0.3);
            assert!((0.1..0.3).contains(&r));
            assert!(gen.pick_index(3) < 3);
        }
        assert_eq!(gen.pick_index(0), 0);
    }

    #[test]
    fn test_seed_from_hash_folds_words() {
        let seed = Seed::from_hash("0x0000000100000002").unwrap();
        assert_eq!(seed.value(), 3);
        let seed = Seed::from_hash("ff").unwrap();
        assert_eq!(seed.value(), 0xFF00_0000);
        assert!(Seed::from_hash("not hex").is_err());
        assert!(matches!(
            Seed::from_hash(""),
            Err(GenesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rng_core_plugs_into_rand() {
        use rand::Rng;
        let mut gen = SeededGenerator::new(Seed::from_nonce(5));
        let v: u8 = gen.gen_range(0..10);
        assert!(v < 10);
    }
}
