//! Fixed-total population allocation across entity roles.
//!
//! Every role first receives a guaranteed minimum. The surplus is split by
//! randomly drawn weights and rounded with the largest-remainder method, so
//! the counts always sum to the requested total.

use crate::error::{GenesisError, Result};
use crate::rng::SeededGenerator;
use cambrium_data::EntityRole;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Closed sub-range raw surplus weights are drawn from.
pub const DEFAULT_WEIGHT_RANGE: (f64, f64) = (0.10, 0.30);

/// Role → entity count. Iteration follows role order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationAllocation {
    counts: BTreeMap<EntityRole, u32>,
}

impl PopulationAllocation {
    #[must_use]
    pub fn get(&self, role: EntityRole) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityRole, u32)> + '_ {
        self.counts.iter().map(|(&role, &count)| (role, count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// One role per entity slot, grouped by role.
    pub fn slots(&self) -> impl Iterator<Item = EntityRole> + '_ {
        self.iter()
            .flat_map(|(role, count)| std::iter::repeat(role).take(count as usize))
    }
}

/// Allocates `total` entities across `roles` using the default weight range.
pub fn allocate(
    total: u32,
    roles: &[EntityRole],
    min_per_role: u32,
    generator: &mut SeededGenerator,
) -> Result<PopulationAllocation> {
    allocate_with_range(total, roles, min_per_role, DEFAULT_WEIGHT_RANGE, generator)
}

pub fn allocate_with_range(
    total: u32,
    roles: &[EntityRole],
    min_per_role: u32,
    weight_range: (f64, f64),
    generator: &mut SeededGenerator,
) -> Result<PopulationAllocation> {
    if roles.is_empty() {
        return Err(GenesisError::invalid_input("role list is empty"));
    }
    let unique: HashSet<_> = roles.iter().collect();
    if unique.len() != roles.len() {
        return Err(GenesisError::invalid_input("role list contains duplicates"));
    }
    let (lo, hi) = weight_range;
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
        return Err(GenesisError::invalid_input(format!(
            "weight range [{lo}, {hi}] must be positive and ordered"
        )));
    }
    let reserved = u64::from(min_per_role) * roles.len() as u64;
    if reserved > u64::from(total) {
        return Err(GenesisError::invalid_input(format!(
            "minimum {min_per_role} x {} roles exceeds total {total}",
            roles.len()
        )));
    }
    let remaining = total - reserved as u32;

    let weights: Vec<f64> = roles.iter().map(|_| generator.range_f64(lo, hi)).collect();
    let surplus = apportion(remaining, &weights)?;

    let counts: BTreeMap<EntityRole, u32> = roles
        .iter()
        .zip(surplus)
        .map(|(&role, extra)| (role, min_per_role + extra))
        .collect();
    let allocation = PopulationAllocation { counts };

    let actual = allocation.total();
    if actual != u64::from(total) {
        tracing::error!(expected = total, actual, "Allocation sum mismatch");
        return Err(GenesisError::AllocationInvariantViolation {
            expected: u64::from(total),
            actual,
        });
    }

    tracing::debug!(total, min_per_role, remaining, ?allocation, "Population allocated");
    Ok(allocation)
}

/// Splits `amount` proportionally to `weights` with largest-remainder
/// rounding. The result always sums to `amount`; ties go to the earlier
/// index.
pub fn apportion(amount: u32, weights: &[f64]) -> Result<Vec<u32>> {
    if weights.is_empty() {
        return Err(GenesisError::invalid_input("no weights to apportion"));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(GenesisError::invalid_input(
            "weights must be finite and non-negative",
        ));
    }
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(GenesisError::invalid_input("weights sum to zero"));
    }

    let exact: Vec<f64> = weights
        .iter()
        .map(|w| (w / sum) * f64::from(amount))
        .collect();
    let mut counts: Vec<u32> = exact
        .iter()
        .map(|e| (e.floor() as u32).min(amount))
        .collect();

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });

    let mut assigned: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    let target = u64::from(amount);

    // Float error can leave the floors off by more than one in either
    // direction; walk the remainder order until the total is exact.
    let mut cursor = 0;
    while assigned < target {
        counts[order[cursor % order.len()]] += 1;
        assigned += 1;
        cursor += 1;
    }
    let mut cursor = order.len();
    while assigned > target {
        cursor = if cursor == 0 { order.len() - 1 } else { cursor - 1 };
        let idx = order[cursor];
        if counts[idx] > 0 {
            counts[idx] -= 1;
            assigned -= 1;
        }
    }

    Ok(counts)
}
