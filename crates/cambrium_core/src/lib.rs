//! # Cambrium Core
//!
//! Deterministic procedural generation and evolution engine. A block nonce
//! becomes a seed; the seed becomes a population of typed organisms whose
//! traits then drift as the block collects confirmations.
//!
//! This crate contains:
//! - A Mulberry32-class generator with purpose-keyed sub-streams
//! - Fixed-total population allocation across entity roles
//! - The role containment and influence matrix
//! - Trait generation and mutation over a category taxonomy
//! - Confirmation milestones gating mutation by probability and rarity
//! - Formation patterns with blending and a bounded LRU cache
//!
//! ## Example
//!
//! ```
//! use cambrium_core::{Engine, GenesisConfig, Seed};
//! use cambrium_data::CategoryDefinition;
//!
//! let mut engine = Engine::new(
//!     GenesisConfig::default(),
//!     CategoryDefinition::default_taxonomy(),
//!     Some(Seed::from_nonce(0xCAFE_BABE)),
//! )
//! .unwrap();
//! let mut population = engine.spawn_population().unwrap();
//! assert_eq!(population.organisms.len(), 500);
//!
//! let fired = engine.advance(&mut population, 100_000).unwrap();
//! assert!(fired.len() < population.organisms.len());
//! ```

/// Fixed-total role allocation
pub mod allocation;
/// Parallel generation across independent seeds
pub mod batch;
/// Chain data provider boundary
pub mod chain;
/// Configuration management for generation parameters
pub mod config;
/// Per-seed generation context with cached purpose streams
pub mod context;
/// Engine facade tying the subsystems together
pub mod engine;
/// Error types and result alias
pub mod error;
/// Formation patterns, blending and caching
pub mod formation;
/// Append-only mutation history
pub mod history;
/// Structured logging setup
pub mod logging;
/// Confirmation milestones and mutation tiers
pub mod milestone;
/// Generated organisms
pub mod organism;
/// Seeded pseudorandom generator
pub mod rng;
/// Role containment and influence
pub mod roles;
/// Trait generation and mutation
pub mod traits;

pub use allocation::{allocate, PopulationAllocation};
pub use config::{GenesisConfig, Taxonomy};
pub use context::GenerationContext;
pub use engine::{Engine, Population};
pub use error::{GenesisError, Result};
pub use formation::{blend, FormationCache, FormationKind, FormationPattern};
pub use logging::{init_env_logging, init_logging};
pub use milestone::{MilestoneSystem, MutationTier};
pub use organism::Organism;
pub use rng::{derive, Seed, SeededGenerator};
pub use roles::{can_contain, influence_strength, RoleMatrix};
pub use traits::{OrganismTraits, TraitEngine};
