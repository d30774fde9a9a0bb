//! Formation patterns, blending, and the per-context pattern cache.
//!
//! Patterns are immutable once built and shared out of the cache as
//! `Arc`s. The cache is bounded and evicts the least recently used entry.

use crate::error::{GenesisError, Result};
use crate::rng::SeededGenerator;
use cambrium_data::Position;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// π(3 − √5) radians.
const GOLDEN_ANGLE: f32 = 2.399_963;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormationKind {
    Grid,
    Ring,
    Spiral,
    Wedge,
    Scatter,
}

impl FormationKind {
    pub const ALL: [FormationKind; 5] = [
        FormationKind::Grid,
        FormationKind::Ring,
        FormationKind::Spiral,
        FormationKind::Wedge,
        FormationKind::Scatter,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FormationKind::Grid => "grid",
            FormationKind::Ring => "ring",
            FormationKind::Spiral => "spiral",
            FormationKind::Wedge => "wedge",
            FormationKind::Scatter => "scatter",
        }
    }

    /// Relative positions for `count` entities. Only `Scatter` draws from
    /// `generator`.
    pub fn positions(
        self,
        count: usize,
        spacing: f32,
        generator: &mut SeededGenerator,
    ) -> Vec<Position> {
        if count == 0 {
            return Vec::new();
        }
        match self {
            FormationKind::Grid => {
                let cols = (count as f32).sqrt().ceil() as usize;
                let rows = count.div_ceil(cols);
                let ox = (cols - 1) as f32 * spacing / 2.0;
                let oy = (rows - 1) as f32 * spacing / 2.0;
                (0..count)
                    .map(|i| {
                        Position::new(
                            (i % cols) as f32 * spacing - ox,
                            (i / cols) as f32 * spacing - oy,
                        )
                    })
                    .collect()
            }
            FormationKind::Ring => {
                let radius = (spacing * count as f32 / TAU).max(spacing);
                (0..count)
                    .map(|i| {
                        let angle = TAU * i as f32 / count as f32;
                        Position::new(radius * angle.cos(), radius * angle.sin())
                    })
                    .collect()
            }
            FormationKind::Spiral => (0..count)
                .map(|i| {
                    let r = spacing * (i as f32).sqrt();
                    let angle = i as f32 * GOLDEN_ANGLE;
                    Position::new(r * angle.cos(), r * angle.sin())
                })
                .collect(),
            FormationKind::Wedge => (0..count)
                .map(|i| {
                    let rank = i.div_ceil(2) as f32;
                    let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                    Position::new(side * rank * spacing, -rank * spacing)
                })
                .collect(),
            FormationKind::Scatter => {
                let half = spacing * (count as f32).sqrt() / 2.0;
                (0..count)
                    .map(|_| {
                        let x = generator.range_f64(-f64::from(half), f64::from(half));
                        let y = generator.range_f64(-f64::from(half), f64::from(half));
                        Position::new(x as f32, y as f32)
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for FormationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormationKind {
    type Err = GenesisError;

    fn from_str(s: &str) -> Result<Self> {
        FormationKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GenesisError::pattern_not_found(s))
    }
}

/// Cache key for a computed pattern. `spacing` prints in its shortest
/// round-trip form, so distinct spacings never share a key.
#[must_use]
pub fn pattern_id(kind: FormationKind, count: usize, spacing: f32) -> String {
    format!("{kind}:{count}:{spacing}")
}

/// A named, immutable set of relative positions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormationPattern {
    id: String,
    positions: Vec<Position>,
}

impl FormationPattern {
    pub fn new(id: impl Into<String>, positions: Vec<Position>) -> Self {
        Self {
            id: id.into(),
            positions,
        }
    }

    pub fn generate(
        kind: FormationKind,
        count: usize,
        spacing: f32,
        generator: &mut SeededGenerator,
    ) -> Self {
        Self::new(
            pattern_id(kind, count, spacing),
            kind.positions(count, spacing, generator),
        )
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Interpolates position `i` of `a` towards position `i` of `b`.
///
/// The result has as many positions as the longer pattern; positions past
/// the shorter one are held at the longer pattern's own values. `t` is
/// clamped to `[0, 1]`; a non-finite `t` is rejected.
pub fn blend(a: &FormationPattern, b: &FormationPattern, t: f32) -> Result<Vec<Position>> {
    if !t.is_finite() {
        return Err(GenesisError::invalid_input(format!("blend factor {t} is not finite")));
    }
    let t = t.clamp(0.0, 1.0);
    let shared = a.len().min(b.len());
    let longer = if a.len() >= b.len() { a } else { b };

    let mut out: Vec<Position> = a.positions[..shared]
        .iter()
        .zip(&b.positions[..shared])
        .map(|(pa, pb)| pa.lerp(*pb, t))
        .collect();
    out.extend_from_slice(&longer.positions[shared..]);
    Ok(out)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    pattern: Arc<FormationPattern>,
    last_used: u64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

/// Bounded LRU cache of formation patterns, owned by a single context.
#[derive(Debug)]
pub struct FormationCache {
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl FormationCache {
    /// A zero capacity cannot hold a pattern long enough to use it.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GenesisError::CacheEvictionFailure(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Looks up a pattern and marks it most recently used.
    pub fn get(&mut self, id: &str) -> Result<Arc<FormationPattern>> {
        let now = self.tick();
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.last_used = now;
                self.hits += 1;
                Ok(Arc::clone(&entry.pattern))
            }
            None => {
                self.misses += 1;
                Err(GenesisError::pattern_not_found(id))
            }
        }
    }

    /// Stores a pattern, returning the entry evicted to make room.
    pub fn insert(&mut self, pattern: FormationPattern) -> Option<Arc<FormationPattern>> {
        self.insert_shared(Arc::new(pattern))
    }

    fn insert_shared(&mut self, pattern: Arc<FormationPattern>) -> Option<Arc<FormationPattern>> {
        let now = self.tick();
        let id = pattern.id().to_string();
        let mut evicted = None;
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                evicted = self.entries.remove(&key).map(|e| e.pattern);
                self.evictions += 1;
                tracing::debug!(evicted = %key, "Formation cache eviction");
            }
        }
        self.entries.insert(
            id,
            CacheEntry {
                pattern,
                last_used: now,
            },
        );
        evicted
    }

    /// Returns the cached pattern for `(kind, count, spacing)`, computing
    /// it on first use.
    pub fn get_or_generate(
        &mut self,
        kind: FormationKind,
        count: usize,
        spacing: f32,
        generator: &mut SeededGenerator,
    ) -> Arc<FormationPattern> {
        let id = pattern_id(kind, count, spacing);
        if let Ok(pattern) = self.get(&id) {
            return pattern;
        }
        let pattern = Arc::new(FormationPattern::generate(kind, count, spacing, generator));
        self.insert_shared(Arc::clone(&pattern));
        pattern
    }

    /// Blends two cached patterns by id.
    pub fn blend_cached(&mut self, a: &str, b: &str, t: f32) -> Result<Vec<Position>> {
        let pa = self.get(a)?;
        let pb = self.get(b)?;
        blend(&pa, &pb, t)
    }

    /// Drops every entry and resets counters to their initial state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.clock = 0;
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            len: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Seed;

    fn gen() -> SeededGenerator {
        SeededGenerator::new(Seed::from_nonce(1))
    }

    fn line(id: &str, xs: &[f32]) -> FormationPattern {
        FormationPattern::new(id, xs.iter().map(|&x| Position::new(x, 0.0)).collect())
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            FormationCache::new(0),
            Err(GenesisError::CacheEvictionFailure(_))
        ));
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = FormationCache::new(2).unwrap();
        assert!(cache.insert(line("a", &[0.0])).is_none());
        assert!(cache.insert(line("b", &[1.0])).is_none());
        cache.get("a").unwrap();
        let evicted = cache.insert(line("c", &[2.0])).unwrap();
        assert_eq!(evicted.id(), "b");
        assert!(cache.contains("a"));
        assert!(cache.get("b").is_err());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let mut cache = FormationCache::new(1).unwrap();
        cache.insert(line("a", &[0.0]));
        assert!(cache.insert(line("a", &[5.0])).is_none());
        assert_eq!(cache.get("a").unwrap().positions()[0].x, 5.0);
    }

    #[test]
    fn test_clear_matches_fresh_cache() {
        let mut cache = FormationCache::new(3).unwrap();
        for id in ["a", "b", "c"] {
            cache.insert(line(id, &[0.0]));
        }
        cache.get("a").unwrap();
        cache.clear();
        assert_eq!(cache.stats(), FormationCache::new(3).unwrap().stats());
        for id in ["a", "b", "c"] {
            let err = cache.get(id).unwrap_err();
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_blend_equal_length() {
        let a = line("a", &[0.0, 10.0]);
        let b = line("b", &[10.0, 20.0]);
        let out = blend(&a, &b, 0.5).unwrap();
        assert_eq!(out, vec![Position::new(5.0, 0.0), Position::new(15.0, 0.0)]);
        assert_eq!(blend(&a, &b, 0.0).unwrap(), a.positions());
        assert_eq!(blend(&a, &b, 1.0).unwrap(), b.positions());
    }

    #[test]
    fn test_blend_holds_tail_of_longer_pattern() {
        let a = line("a", &[0.0]);
        let b = line("b", &[10.0, 20.0, 30.0]);
        let out = blend(&a, &b, 0.5).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].x, 5.0);
        assert_eq!(out[1].x, 20.0);
        assert_eq!(out[2].x, 30.0);
        let reversed = blend(&b, &a, 0.25).unwrap();
        assert_eq!(reversed[0].x, 7.5);
        assert_eq!(reversed[2].x, 30.0);
    }

    #[test]
    fn test_blend_factor_validation() {
        let a = line("a", &[0.0]);
        let b = line("b", &[10.0]);
        assert!(blend(&a, &b, f32::NAN).is_err());
        assert_eq!(blend(&a, &b, 2.0).unwrap()[0].x, 10.0);
        assert_eq!(blend(&a, &b, -1.0).unwrap()[0].x, 0.0);
    }

    #[test]
    fn test_kinds_produce_requested_count() {
        for kind in FormationKind::ALL {
            for count in [0, 1, 7, 40] {
                let pattern = FormationPattern::generate(kind, count, 1.5, &mut gen());
                assert_eq!(pattern.len(), count, "{kind}");
                assert!(pattern.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
            }
        }
    }

    #[test]
    fn test_grid_is_centered() {
        let pattern = FormationPattern::generate(FormationKind::Grid, 9, 2.0, &mut gen());
        let cx: f32 = pattern.positions().iter().map(|p| p.x).sum();
        let cy: f32 = pattern.positions().iter().map(|p| p.y).sum();
        assert!(cx.abs() < 1e-4 && cy.abs() < 1e-4);
    }

    #[test]
    fn test_scatter_is_seeded() {
        let a = FormationPattern::generate(FormationKind::Scatter, 16, 1.0, &mut gen());
        let b = FormationPattern::generate(FormationKind::Scatter, 16, 1.0, &mut gen());
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_or_generate_hits_cache() {
        let mut cache = FormationCache::new(4).unwrap();
        let mut g = gen();
        let first = cache.get_or_generate(FormationKind::Ring, 12, 1.0, &mut g);
        let second = cache.get_or_generate(FormationKind::Ring, 12, 1.0, &mut g);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(first.id(), "ring:12:1");
    }

    #[test]
    fn test_nearby_spacings_cached_separately() {
        let mut cache = FormationCache::new(4).unwrap();
        let mut g = gen();
        let wide = cache.get_or_generate(FormationKind::Grid, 4, 1.0004, &mut g);
        let narrow = cache.get_or_generate(FormationKind::Grid, 4, 1.0001, &mut g);
        assert_ne!(wide.id(), narrow.id());
        assert!(!Arc::ptr_eq(&wide, &narrow));
        assert_eq!(cache.len(), 2);

        let fresh = FormationPattern::generate(FormationKind::Grid, 4, 1.0001, &mut gen());
        assert_eq!(narrow.positions(), fresh.positions());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Spiral".parse::<FormationKind>().unwrap(), FormationKind::Spiral);
        assert!("hexagon".parse::<FormationKind>().is_err());
    }
}
