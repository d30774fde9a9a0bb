//! Confirmation milestones gating trait mutation.
//!
//! Tiers are declared data, ascending by threshold. When an organism is
//! polled, only the highest reached tier is evaluated; evaluating it consumes
//! that threshold and every lower one, whether or not the roll succeeds, so
//! polling again with the same or a lower count never fires twice.
//!
//! The trigger roll and the trait selection are separate draws from
//! separate purpose streams.

use crate::context::GenerationContext;
use crate::error::{GenesisError, Result};
use crate::organism::Organism;
use crate::rng::SeededGenerator;
use crate::traits::{OrganismTraits, TraitEngine};
use cambrium_data::{MutationEvent, Rarity};
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MutationTier {
    pub threshold: u64,
    /// Chance that reaching this tier mutates a trait.
    pub probability: f64,
    /// Rarity class this tier favours.
    pub rarity: Rarity,
    /// Weight given to traits of `rarity`; all others weigh 1.0.
    pub rarity_weight: f64,
}

impl MutationTier {
    #[must_use]
    pub fn new(threshold: u64, probability: f64, rarity: Rarity, rarity_weight: f64) -> Self {
        Self {
            threshold,
            probability,
            rarity,
            rarity_weight,
        }
    }

    #[must_use]
    pub fn default_tiers() -> Vec<MutationTier> {
        vec![
            MutationTier::new(10_000, 0.01, Rarity::Common, 3.0),
            MutationTier::new(50_000, 0.05, Rarity::Uncommon, 3.0),
            MutationTier::new(100_000, 0.10, Rarity::Rare, 5.0),
        ]
    }

    #[must_use]
    pub fn weight_for(&self, rarity: Rarity) -> f64 {
        if rarity == self.rarity {
            self.rarity_weight
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct MilestoneSystem {
    tiers: Vec<MutationTier>,
}

impl Default for MilestoneSystem {
    fn default() -> Self {
        Self {
            tiers: MutationTier::default_tiers(),
        }
    }
}

impl MilestoneSystem {
    pub fn new(tiers: Vec<MutationTier>) -> Result<Self> {
        for tier in &tiers {
            if !(0.0..=1.0).contains(&tier.probability) {
                return Err(GenesisError::invalid_input(format!(
                    "tier {} probability {} outside [0, 1]",
                    tier.threshold, tier.probability
                )));
            }
            if !(tier.rarity_weight.is_finite() && tier.rarity_weight > 0.0) {
                return Err(GenesisError::invalid_input(format!(
                    "tier {} rarity weight must be positive",
                    tier.threshold
                )));
            }
        }
        if tiers.windows(2).any(|w| w[0].threshold >= w[1].threshold) {
            return Err(GenesisError::invalid_input(
                "tier thresholds must be strictly ascending",
            ));
        }
        Ok(Self { tiers })
    }

    #[must_use]
    pub fn tiers(&self) -> &[MutationTier] {
        &self.tiers
    }

    /// Highest tier whose threshold `confirmations` has reached.
    #[must_use]
    pub fn check_milestone(&self, confirmations: u64) -> Option<&MutationTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| confirmations >= tier.threshold)
    }

    /// The tier `organism` may still fire at `confirmations`, if any.
    #[must_use]
    pub fn pending_tier(&self, organism: &Organism, confirmations: u64) -> Option<&MutationTier> {
        self.check_milestone(confirmations)
            .filter(|tier| !organism.has_consumed(tier.threshold))
    }

    /// Every trait key present on the organism with its selection weight
    /// under `tier`.
    #[must_use]
    pub fn weighted_candidates(
        &self,
        tier: &MutationTier,
        engine: &TraitEngine,
        traits: &OrganismTraits,
    ) -> Vec<(String, f64)> {
        engine
            .categories()
            .iter()
            .filter_map(|category| {
                traits
                    .category(&category.name)
                    .map(|assigned| (category, assigned))
            })
            .flat_map(|(category, assigned)| {
                let weight = tier.weight_for(category.rarity);
                assigned
                    .keys()
                    .map(move |name| (format!("{}.{}", category.name, name), weight))
            })
            .collect()
    }

    /// Picks one candidate key by weight.
    pub fn select_trait(
        candidates: &[(String, f64)],
        generator: &mut SeededGenerator,
    ) -> Option<String> {
        let dist = WeightedIndex::<f64>::new(candidates.iter().map(|(_, w)| *w)).ok()?;
        Some(candidates[dist.sample(generator)].0.clone())
    }

    /// Polls `organism` at `confirmations`, mutating one trait if the tier
    /// fires.
    pub fn evaluate(
        &self,
        organism: &mut Organism,
        confirmations: u64,
        engine: &TraitEngine,
        ctx: &mut GenerationContext,
    ) -> Result<Option<MutationEvent>> {
        let Some(tier) = self.pending_tier(organism, confirmations).cloned() else {
            return Ok(None);
        };
        organism.consume(
            self.tiers
                .iter()
                .map(|t| t.threshold)
                .filter(|&t| t <= tier.threshold),
        );

        let roll = ctx.stream(&format!("milestone/{}", organism.id)).next_f64();
        if roll >= tier.probability {
            tracing::debug!(
                organism = %organism.id,
                threshold = tier.threshold,
                roll,
                "Milestone reached without mutation"
            );
            return Ok(None);
        }

        let candidates = self.weighted_candidates(&tier, engine, organism.traits());
        let selector = ctx.stream(&format!("milestone-trait/{}", organism.id));
        let Some(key) = Self::select_trait(&candidates, selector) else {
            tracing::warn!(organism = %organism.id, "Milestone fired with no mutable traits");
            return Ok(None);
        };

        let mutator = ctx.stream(&format!("mutation/{}", organism.id));
        let change = engine.mutate(organism.traits_mut(), &key, mutator)?;
        let event = MutationEvent {
            organism_id: organism.id,
            trait_key: change.key,
            old_value: change.old_value,
            new_value: change.new_value,
            confirmations,
            threshold: tier.threshold,
        };
        tracing::info!(
            organism = %organism.id,
            threshold = tier.threshold,
            trait_key = %event.trait_key,
            from = %event.old_value,
            to = %event.new_value,
            "Milestone mutation"
        );
        organism.record(event.clone());
        Ok(Some(event))
    }
}
