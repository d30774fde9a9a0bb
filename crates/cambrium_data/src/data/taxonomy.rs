use serde::{Deserialize, Serialize};

/// Rarity class of a trait category. Milestone tiers bias mutation towards
/// categories of their own rarity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
}

/// One trait and its ordered list of possible values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TraitDomain {
    pub name: String,
    pub values: Vec<String>,
}

impl TraitDomain {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A named trait category such as `visual` or `behavior`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    pub traits: Vec<TraitDomain>,
}

impl CategoryDefinition {
    pub fn new(name: impl Into<String>, rarity: Rarity, traits: Vec<TraitDomain>) -> Self {
        Self {
            name: name.into(),
            rarity,
            traits,
        }
    }

    #[must_use]
    pub fn trait_domain(&self, name: &str) -> Option<&TraitDomain> {
        self.traits.iter().find(|t| t.name == name)
    }

    /// The built-in taxonomy used when no taxonomy file is supplied.
    #[must_use]
    pub fn default_taxonomy() -> Vec<CategoryDefinition> {
        vec![
            CategoryDefinition::new(
                "visual",
                Rarity::Common,
                vec![
                    TraitDomain::new("Color", ["Red", "Green", "Blue", "Amber", "Violet"]),
                    TraitDomain::new("Shape", ["Sphere", "Cube", "Helix", "Shard"]),
                    TraitDomain::new("Glow", ["None", "Soft", "Pulse"]),
                ],
            ),
            CategoryDefinition::new(
                "behavior",
                Rarity::Uncommon,
                vec![
                    TraitDomain::new("Temperament", ["Calm", "Curious", "Aggressive"]),
                    TraitDomain::new("Grouping", ["Solitary", "Pair", "Swarm"]),
                ],
            ),
            CategoryDefinition::new(
                "physiology",
                Rarity::Rare,
                vec![
                    TraitDomain::new("Metabolism", ["Slow", "Balanced", "Rapid"]),
                    TraitDomain::new("Shell", ["Soft", "Plated", "Crystalline"]),
                ],
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_serde_lowercase() {
        let json = serde_json::to_string(&Rarity::Uncommon).unwrap();
        assert_eq!(json, "\"uncommon\"");
    }

    #[test]
    fn test_default_taxonomy_has_non_empty_domains() {
        for category in CategoryDefinition::default_taxonomy() {
            assert!(!category.traits.is_empty(), "{} has no traits", category.name);
            for domain in &category.traits {
                assert!(domain.len() > 1, "{}.{} is degenerate", category.name, domain.name);
            }
        }
    }

    #[test]
    fn test_rarity_defaults_to_common_when_omitted() {
        let category: CategoryDefinition =
            serde_json::from_str(r#"{"name":"visual","traits":[]}"#).unwrap();
        assert_eq!(category.rarity, Rarity::Common);
    }
}
