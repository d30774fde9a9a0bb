//! Parallel generation across seeds.
//!
//! Each seed gets its own engine; nothing crosses between workers, so the
//! output for a seed is identical to a sequential run.

use crate::config::GenesisConfig;
use crate::engine::{Engine, Population};
use crate::error::Result;
use crate::rng::Seed;
use cambrium_data::CategoryDefinition;
use rayon::prelude::*;

/// Spawns one population per seed, preserving input order.
pub fn spawn_many(
    seeds: &[Seed],
    config: &GenesisConfig,
    categories: &[CategoryDefinition],
) -> Vec<Result<Population>> {
    seeds
        .par_iter()
        .map(|&seed| {
            Engine::new(config.clone(), categories.to_vec(), Some(seed))?.spawn_population()
        })
        .collect()
}
