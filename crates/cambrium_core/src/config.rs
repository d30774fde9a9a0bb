//! Configuration management for generation parameters.
//!
//! Strongly-typed sections mapping onto `cambrium.toml`. Every section has
//! defaults, so a file only needs to list what it overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `cambrium.toml` (overrides defaults)
//!
//! ## Example `cambrium.toml`
//!
//! ```toml
//! [population]
//! total = 500
//! min_per_role = 40
//!
//! [formation]
//! cache_capacity = 32
//!
//! [[milestones]]
//! threshold = 10000
//! probability = 0.01
//! rarity = "common"
//! rarity_weight = 3.0
//! ```

use crate::milestone::MutationTier;
use crate::rng::ChainSettings;
use cambrium_data::{CategoryDefinition, EntityRole};
use serde::{Deserialize, Serialize};

/// Population size and the surplus weighting used by allocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub total: u32,
    pub min_per_role: u32,
    pub weight_min: f64,
    pub weight_max: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            total: 500,
            min_per_role: 40,
            weight_min: 0.10,
            weight_max: 0.30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rehash_interval: u32,
    pub rehash_capacity: usize,
    /// Redraw budget when a mutation keeps landing on the current value.
    pub max_redraws: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rehash_interval: 10,
            rehash_capacity: 100,
            max_redraws: 32,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FormationConfig {
    pub cache_capacity: usize,
    pub spacing: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 32,
            spacing: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenesisConfig {
    pub population: PopulationConfig,
    pub generator: GeneratorConfig,
    pub formation: FormationConfig,
    pub milestones: Vec<MutationTier>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            generator: GeneratorConfig::default(),
            formation: FormationConfig::default(),
            milestones: MutationTier::default_tiers(),
        }
    }
}

impl GenesisConfig {
    /// Validates all configuration parameters.
    ///
    /// # Validation Rules
    /// - Population total is positive and the per-role minimum fits in it
    /// - Weight range is positive and ordered
    /// - Re-hash interval, capacity, redraw budget and cache capacity are non-zero
    /// - Tier probabilities are in [0.0, 1.0], rarity weights positive,
    ///   thresholds strictly ascending
    pub fn validate(&self) -> anyhow::Result<()> {
        // Population validation
        anyhow::ensure!(self.population.total > 0, "Population total must be positive");
        anyhow::ensure!(
            u64::from(self.population.min_per_role) * EntityRole::ALL.len() as u64
                <= u64::from(self.population.total),
            "Per-role minimum exceeds population total"
        );
        anyhow::ensure!(
            self.population.weight_min > 0.0,
            "Minimum surplus weight must be positive"
        );
        anyhow::ensure!(
            self.population.weight_min <= self.population.weight_max,
            "Surplus weight range must be ordered"
        );
        anyhow::ensure!(
            self.population.weight_max.is_finite(),
            "Maximum surplus weight must be finite"
        );

        // Generator validation
        anyhow::ensure!(
            self.generator.rehash_interval > 0,
            "Re-hash interval must be positive"
        );
        anyhow::ensure!(
            self.generator.rehash_capacity > 0,
            "Re-hash capacity must be positive"
        );
        anyhow::ensure!(self.generator.max_redraws > 0, "Redraw budget must be positive");

        // Formation validation
        anyhow::ensure!(
            self.formation.cache_capacity > 0,
            "Formation cache capacity must be positive"
        );
        anyhow::ensure!(
            self.formation.spacing.is_finite() && self.formation.spacing > 0.0,
            "Formation spacing must be positive"
        );

        // Milestone validation
        for tier in &self.milestones {
            anyhow::ensure!(
                (0.0..=1.0).contains(&tier.probability),
                "Tier {} probability must be in [0.0, 1.0]",
                tier.threshold
            );
            anyhow::ensure!(
                tier.rarity_weight.is_finite() && tier.rarity_weight > 0.0,
                "Tier {} rarity weight must be positive",
                tier.threshold
            );
        }
        anyhow::ensure!(
            self.milestones
                .windows(2)
                .all(|w| w[0].threshold < w[1].threshold),
            "Milestone thresholds must be strictly ascending"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates `path`.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[must_use]
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            interval: self.generator.rehash_interval,
            capacity: self.generator.rehash_capacity,
        }
    }

    /// SHA-256 over every setting that influences generated output.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.population).as_bytes());
        hasher.update(format!("{:?}", self.generator).as_bytes());
        hasher.update(format!("{:?}", self.formation).as_bytes());
        hasher.update(format!("{:?}", self.milestones).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A trait taxonomy file: a list of `[[categories]]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Taxonomy {
    pub categories: Vec<CategoryDefinition>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: CategoryDefinition::default_taxonomy(),
        }
    }
}

impl Taxonomy {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let taxonomy = toml::from_str::<Self>(content)?;
        anyhow::ensure!(
            !taxonomy.categories.is_empty(),
            "Taxonomy must define at least one category"
        );
        for category in &taxonomy.categories {
            anyhow::ensure!(
                !category.traits.is_empty(),
                "Category {} must define at least one trait",
                category.name
            );
        }
        Ok(taxonomy)
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
