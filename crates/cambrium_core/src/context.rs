//! Per-request generation context.
//!
//! A context owns the root generator for one seed and lazily caches every
//! purpose stream derived from it. Contexts are never shared; run one per
//! seed when generating in parallel.

use crate::error::Result;
use crate::rng::{derive, ChainSettings, Seed, SeededGenerator};
use cambrium_data::BlockDescriptor;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct GenerationContext {
    root: SeededGenerator,
    streams: HashMap<String, SeededGenerator>,
}

impl GenerationContext {
    /// Fails with `SeedUnavailable` when `seed` is `None`.
    pub fn new(seed: Option<Seed>) -> Result<Self> {
        Ok(Self {
            root: derive(seed)?,
            streams: HashMap::new(),
        })
    }

    pub fn with_settings(seed: Option<Seed>, settings: ChainSettings) -> Result<Self> {
        let root = derive(seed)?;
        Ok(Self {
            root: SeededGenerator::with_settings(root.seed(), settings),
            streams: HashMap::new(),
        })
    }

    #[must_use]
    pub fn from_block(block: &BlockDescriptor) -> Self {
        Self {
            root: SeededGenerator::new(Seed::from_block(block)),
            streams: HashMap::new(),
        }
    }

    #[must_use]
    pub fn seed(&self) -> Seed {
        self.root.seed()
    }

    #[must_use]
    pub fn root(&self) -> &SeededGenerator {
        &self.root
    }

    /// The stream for `purpose`, created on first use and kept for the
    /// lifetime of the context.
    pub fn stream(&mut self, purpose: &str) -> &mut SeededGenerator {
        let root = &self.root;
        self.streams
            .entry(purpose.to_string())
            .or_insert_with(|| {
                tracing::debug!(purpose, "Opening purpose stream");
                root.stream(purpose)
            })
    }

    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn has_stream(&self, purpose: &str) -> bool {
        self.streams.contains_key(purpose)
    }
}
