//! One engine per seed: population spawning, milestone polling, formations.
//!
//! An `Engine` owns its generation context and formation cache outright;
//! nothing in it is shared, so independent engines can run on independent
//! threads.

use crate::allocation::{allocate_with_range, PopulationAllocation};
use crate::config::GenesisConfig;
use crate::context::GenerationContext;
use crate::error::{GenesisError, Result};
use crate::formation::{FormationCache, FormationKind, FormationPattern};
use crate::milestone::MilestoneSystem;
use crate::organism::{organism_id, Organism};
use crate::rng::Seed;
use crate::roles::RoleMatrix;
use crate::traits::TraitEngine;
use cambrium_data::{BlockDescriptor, CategoryDefinition, EntityRole, MutationEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A generated population: the role split plus one organism per slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Population {
    pub seed: Seed,
    pub allocation: PopulationAllocation,
    pub organisms: Vec<Organism>,
}

impl Population {
    pub fn by_role(&self, role: EntityRole) -> impl Iterator<Item = &Organism> {
        self.organisms.iter().filter(move |o| o.role == role)
    }

    /// Every recorded mutation across the population, in organism order.
    #[must_use]
    pub fn history(&self) -> Vec<MutationEvent> {
        self.organisms
            .iter()
            .flat_map(|o| o.history().iter().cloned())
            .collect()
    }
}

pub struct Engine {
    config: GenesisConfig,
    traits: TraitEngine,
    milestones: MilestoneSystem,
    formations: FormationCache,
    context: GenerationContext,
    matrix: RoleMatrix,
}

impl Engine {
    pub fn new(
        config: GenesisConfig,
        categories: Vec<CategoryDefinition>,
        seed: Option<Seed>,
    ) -> Result<Self> {
        let context = GenerationContext::with_settings(seed, config.chain_settings())?;
        let formations = FormationCache::new(config.formation.cache_capacity)?;
        config
            .validate()
            .map_err(|e| GenesisError::invalid_input(e.to_string()))?;
        let traits = TraitEngine::new(categories)?.with_max_redraws(config.generator.max_redraws);
        let milestones = MilestoneSystem::new(config.milestones.clone())?;
        tracing::debug!(
            seed = context.seed().value(),
            fingerprint = %config.fingerprint(),
            "Engine created"
        );
        Ok(Self {
            config,
            traits,
            milestones,
            formations,
            context,
            matrix: RoleMatrix::build(),
        })
    }

    pub fn from_block(
        config: GenesisConfig,
        categories: Vec<CategoryDefinition>,
        block: &BlockDescriptor,
    ) -> Result<Self> {
        Self::new(config, categories, Some(Seed::from_block(block)))
    }

    #[must_use]
    pub fn seed(&self) -> Seed {
        self.context.seed()
    }

    #[must_use]
    pub fn config(&self) -> &GenesisConfig {
        &self.config
    }

    #[must_use]
    pub fn trait_engine(&self) -> &TraitEngine {
        &self.traits
    }

    #[must_use]
    pub fn milestones(&self) -> &MilestoneSystem {
        &self.milestones
    }

    #[must_use]
    pub fn role_matrix(&self) -> &RoleMatrix {
        &self.matrix
    }

    pub fn context_mut(&mut self) -> &mut GenerationContext {
        &mut self.context
    }

    pub fn formations_mut(&mut self) -> &mut FormationCache {
        &mut self.formations
    }

    /// Splits the configured total across all roles.
    pub fn allocate(&mut self) -> Result<PopulationAllocation> {
        let population = &self.config.population;
        allocate_with_range(
            population.total,
            &EntityRole::ALL,
            population.min_per_role,
            (population.weight_min, population.weight_max),
            self.context.stream("allocation"),
        )
    }

    /// Allocates roles and generates one organism per slot. Each organism
    /// derives its own stream from the root seed by slot index.
    pub fn spawn_population(&mut self) -> Result<Population> {
        let allocation = self.allocate()?;
        let root = self.context.root().clone();
        let organisms: Vec<Organism> = allocation
            .slots()
            .enumerate()
            .map(|(index, role)| {
                let organism_gen = root.stream(&format!("organism/{index}"));
                let id = organism_id(&mut organism_gen.stream("identity"));
                let traits = self.traits.generate(&organism_gen);
                Organism::new(id, index as u32, role, traits)
            })
            .collect();

        tracing::info!(
            seed = self.seed().value(),
            organisms = organisms.len(),
            allocation = ?allocation,
            "Population spawned"
        );
        Ok(Population {
            seed: self.seed(),
            allocation,
            organisms,
        })
    }

    /// Polls every organism at `confirmations` and returns the mutations
    /// that fired.
    pub fn advance(
        &mut self,
        population: &mut Population,
        confirmations: u64,
    ) -> Result<Vec<MutationEvent>> {
        let mut fired = Vec::new();
        for organism in &mut population.organisms {
            if let Some(event) =
                self.milestones
                    .evaluate(organism, confirmations, &self.traits, &mut self.context)?
            {
                fired.push(event);
            }
        }
        if !fired.is_empty() {
            tracing::info!(confirmations, mutations = fired.len(), "Milestones fired");
        }
        Ok(fired)
    }

    /// Cached formation for `count` entities at the configured spacing.
    pub fn formation(&mut self, kind: FormationKind, count: usize) -> Arc<FormationPattern> {
        let spacing = self.config.formation.spacing;
        let generator = self.context.stream("formation");
        self.formations
            .get_or_generate(kind, count, spacing, generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::MutationTier;
    use cambrium_data::Rarity;

    fn engine(seed: u32) -> Engine {
        Engine::new(
            GenesisConfig::default(),
            CategoryDefinition::default_taxonomy(),
            Some(Seed::from_nonce(seed)),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_seed() {
        let result = Engine::new(
            GenesisConfig::default(),
            CategoryDefinition::default_taxonomy(),
            None,
        );
        assert!(matches!(result, Err(GenesisError::SeedUnavailable)));
    }

    #[test]
    fn test_zero_cache_capacity_fails_at_construction() {
        let mut config = GenesisConfig::default();
        config.formation.cache_capacity = 0;
        let result = Engine::new(
            config,
            CategoryDefinition::default_taxonomy(),
            Some(Seed::from_nonce(1)),
        );
        assert!(matches!(result, Err(GenesisError::CacheEvictionFailure(_))));
    }

    #[test]
    fn test_spawn_population_matches_allocation() {
        let mut engine = engine(0xCAFE_BABE);
        let population = engine.spawn_population().unwrap();
        assert_eq!(population.organisms.len(), 500);
        for (role, count) in population.allocation.iter() {
            assert_eq!(population.by_role(role).count(), count as usize);
            assert!(count >= 40);
        }
        let ids: std::collections::HashSet<_> =
            population.organisms.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_spawn_is_reproducible() {
        let a = engine(42).spawn_population().unwrap();
        let b = engine(42).spawn_population().unwrap();
        assert_eq!(a, b);
        let c = engine(43).spawn_population().unwrap();
        assert_ne!(a.organisms[0].id, c.organisms[0].id);
    }

    #[test]
    fn test_advance_fires_each_tier_once() {
        let mut config = GenesisConfig::default();
        config.milestones = vec![MutationTier::new(100, 1.0, Rarity::Common, 1.0)];
        let mut engine = Engine::new(
            config,
            CategoryDefinition::default_taxonomy(),
            Some(Seed::from_nonce(5)),
        )
        .unwrap();
        let mut population = engine.spawn_population().unwrap();
        assert!(engine.advance(&mut population, 99).unwrap().is_empty());
        let fired = engine.advance(&mut population, 100).unwrap();
        assert_eq!(fired.len(), 500);
        assert!(engine.advance(&mut population, 150).unwrap().is_empty());
        assert_eq!(population.history(), fired);
    }

    #[test]
    fn test_formation_is_cached() {
        let mut engine = engine(1);
        let a = engine.formation(FormationKind::Scatter, 20);
        let b = engine.formation(FormationKind::Scatter, 20);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.formations_mut().len(), 1);
    }
}
