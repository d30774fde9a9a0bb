use cambrium_core::{Engine, GenesisConfig, MutationTier, Seed};
use cambrium_data::{CategoryDefinition, Rarity, TraitDomain};

/// Spreads sequential trial numbers across the seed space.
#[allow(dead_code)]
pub fn spread_seed(i: u32) -> Seed {
    Seed::from_nonce(i.wrapping_mul(0x9E37_79B1))
}

#[allow(dead_code)]
pub fn color_taxonomy() -> Vec<CategoryDefinition> {
    vec![CategoryDefinition::new(
        "visual",
        Rarity::Common,
        vec![TraitDomain::new("Color", ["Red", "Green", "Blue"])],
    )]
}

/// Smallest valid population: one organism per role.
#[allow(dead_code)]
pub fn tiny_config(tiers: Vec<MutationTier>) -> GenesisConfig {
    let mut config = GenesisConfig::default();
    config.population.total = 5;
    config.population.min_per_role = 1;
    config.milestones = tiers;
    config
}

#[allow(dead_code)]
pub fn engine(seed: Seed) -> Engine {
    Engine::new(
        GenesisConfig::default(),
        CategoryDefinition::default_taxonomy(),
        Some(seed),
    )
    .expect("default engine")
}
