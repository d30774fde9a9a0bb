//! Deterministic trait assignment and mutation.
//!
//! Each category draws from its own purpose stream (`traits/<category>`),
//! so adding a category never reshuffles the values of existing ones.
//! Trait keys are addressed as `category.trait`.

use crate::error::{GenesisError, Result};
use crate::rng::SeededGenerator;
use cambrium_data::{CategoryDefinition, TraitDomain};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_MAX_REDRAWS: u32 = 32;

/// Category → trait → selected value.
///
/// Built by [`TraitEngine::generate`] and only changed through
/// [`TraitEngine::mutate`]; consumers get read access.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct OrganismTraits {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl OrganismTraits {
    #[must_use]
    pub fn get(&self, category: &str, name: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|traits| traits.get(name))
            .map(String::as_str)
    }

    /// Looks up a `category.trait` key.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&str> {
        let (category, name) = key.split_once('.')?;
        self.get(category, name)
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.categories.get(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All `category.trait` keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(cat, traits)| traits.keys().map(move |t| format!("{cat}.{t}")))
            .collect()
    }

    #[must_use]
    pub fn trait_count(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    fn set(&mut self, category: &str, name: &str, value: String) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }
}

/// Outcome of a single mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TraitChange {
    pub key: String,
    pub old_value: String,
    pub new_value: String,
    /// Extra draws needed to land on a different value.
    pub redraws: u32,
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    key.split_once('.')
        .filter(|(c, t)| !c.is_empty() && !t.is_empty())
        .ok_or_else(|| GenesisError::unknown_trait(key))
}

pub struct TraitEngine {
    categories: Vec<CategoryDefinition>,
    max_redraws: u32,
}

impl TraitEngine {
    /// Validates a taxonomy: unique category names, unique trait names per
    /// category, no empty domains, no `.` in names.
    pub fn new(categories: Vec<CategoryDefinition>) -> Result<Self> {
        let mut names = HashSet::new();
        for category in &categories {
            if category.name.is_empty() || category.name.contains('.') {
                return Err(GenesisError::invalid_input(format!(
                    "invalid category name {:?}",
                    category.name
                )));
            }
            if !names.insert(category.name.as_str()) {
                return Err(GenesisError::invalid_input(format!(
                    "duplicate category {}",
                    category.name
                )));
            }
            if category.traits.is_empty() {
                return Err(GenesisError::invalid_input(format!(
                    "category {} defines no traits",
                    category.name
                )));
            }
            let mut trait_names = HashSet::new();
            for domain in &category.traits {
                if domain.name.is_empty() || domain.name.contains('.') {
                    return Err(GenesisError::invalid_input(format!(
                        "invalid trait name {:?} in {}",
                        domain.name, category.name
                    )));
                }
                if !trait_names.insert(domain.name.as_str()) {
                    return Err(GenesisError::invalid_input(format!(
                        "duplicate trait {}.{}",
                        category.name, domain.name
                    )));
                }
                if domain.is_empty() {
                    return Err(GenesisError::invalid_input(format!(
                        "trait {}.{} has no values",
                        category.name, domain.name
                    )));
                }
            }
        }
        Ok(Self {
            categories,
            max_redraws: DEFAULT_MAX_REDRAWS,
        })
    }

    #[must_use]
    pub fn with_max_redraws(mut self, max_redraws: u32) -> Self {
        self.max_redraws = max_redraws.max(1);
        self
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Result<&CategoryDefinition> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| GenesisError::unknown_category(name))
    }

    /// Resolves a `category.trait` key against the loaded taxonomy.
    pub fn domain(&self, key: &str) -> Result<(&CategoryDefinition, &TraitDomain)> {
        let (category, name) = split_key(key)?;
        let definition = self
            .categories
            .iter()
            .find(|c| c.name == category)
            .ok_or_else(|| GenesisError::unknown_trait(key))?;
        let domain = definition
            .trait_domain(name)
            .ok_or_else(|| GenesisError::unknown_trait(key))?;
        Ok((definition, domain))
    }

    /// Assigns every trait of every category.
    #[must_use]
    pub fn generate(&self, generator: &SeededGenerator) -> OrganismTraits {
        let mut traits = OrganismTraits::default();
        for category in &self.categories {
            Self::fill_category(&mut traits, category, generator);
        }
        traits
    }

    /// Assigns only the named categories; every name must be loaded.
    pub fn generate_subset(
        &self,
        names: &[&str],
        generator: &SeededGenerator,
    ) -> Result<OrganismTraits> {
        let selected = names
            .iter()
            .map(|name| self.category(name))
            .collect::<Result<Vec<_>>>()?;
        let mut traits = OrganismTraits::default();
        for category in selected {
            Self::fill_category(&mut traits, category, generator);
        }
        Ok(traits)
    }

    fn fill_category(
        traits: &mut OrganismTraits,
        category: &CategoryDefinition,
        generator: &SeededGenerator,
    ) {
        let mut stream = generator.stream(&format!("traits/{}", category.name));
        for domain in &category.traits {
            let idx = stream.pick_index(domain.len());
            traits.set(&category.name, &domain.name, domain.values[idx].clone());
        }
        tracing::debug!(
            category = %category.name,
            traits = category.traits.len(),
            "Generated category traits"
        );
    }

    /// Replaces the value of `key` with a different value from the same
    /// domain. Single-value domains leave the trait unchanged.
    pub fn mutate(
        &self,
        traits: &mut OrganismTraits,
        key: &str,
        generator: &mut SeededGenerator,
    ) -> Result<TraitChange> {
        let (category, domain) = self.domain(key)?;
        let current = traits
            .get(&category.name, &domain.name)
            .ok_or_else(|| GenesisError::unknown_trait(key))?
            .to_string();

        let mut redraws = 0;
        let new_value = if domain.len() <= 1 {
            current.clone()
        } else {
            let mut drawn = None;
            for attempt in 0..self.max_redraws {
                let candidate = &domain.values[generator.pick_index(domain.len())];
                if *candidate != current {
                    redraws = attempt;
                    drawn = Some(candidate.clone());
                    break;
                }
            }
            match drawn {
                Some(value) => value,
                None => {
                    redraws = self.max_redraws;
                    let fallback = domain.values.iter().find(|v| **v != current).cloned();
                    tracing::warn!(
                        key,
                        max_redraws = self.max_redraws,
                        "Mutation redraw budget exhausted"
                    );
                    fallback.unwrap_or_else(|| current.clone())
                }
            }
        };

        traits.set(&category.name, &domain.name, new_value.clone());
        Ok(TraitChange {
            key: key.to_string(),
            old_value: current,
            new_value,
            redraws,
        })
    }
}

/// Validates `categories` and generates traits in one step.
pub fn generate(
    categories: &[CategoryDefinition],
    generator: &SeededGenerator,
) -> Result<OrganismTraits> {
    Ok(TraitEngine::new(categories.to_vec())?.generate(generator))
}
