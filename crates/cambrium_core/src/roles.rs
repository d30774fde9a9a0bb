//! Role hierarchy: which roles may contain or influence which others.
//!
//! The table is fixed and pure. `Core` contains everything, `Control`
//! contains everything except `Core`, and the remaining roles only contain
//! their own kind. Same-role influence is always weaker than containment by
//! a more dominant role.

use cambrium_data::EntityRole;
use serde::{Deserialize, Serialize};

/// Whether an `outer` entity may contain an `inner` one.
#[must_use]
pub fn can_contain(outer: EntityRole, inner: EntityRole) -> bool {
    match outer {
        EntityRole::Core => true,
        EntityRole::Control => inner != EntityRole::Core,
        _ => outer == inner,
    }
}

/// Influence of `outer` over `inner` in `[0, 1]`; zero whenever
/// [`can_contain`] is false.
#[must_use]
pub fn influence_strength(outer: EntityRole, inner: EntityRole) -> f32 {
    use EntityRole::{Attack, Control, Core, Defense, Movement};

    if !can_contain(outer, inner) {
        return 0.0;
    }
    match (outer, inner) {
        (Core, Core) => 0.40,
        (Core, Control) => 0.90,
        (Core, Defense) | (Core, Attack) | (Core, Movement) => 0.80,
        (Control, Control) => 0.35,
        (Control, Defense) => 0.70,
        (Control, Attack) => 0.75,
        (Control, Movement) => 0.65,
        (Defense, Defense) | (Attack, Attack) | (Movement, Movement) => 0.30,
        _ => 0.0,
    }
}

/// Roles an `outer` entity may contain, in canonical order.
pub fn containable(outer: EntityRole) -> impl Iterator<Item = EntityRole> {
    EntityRole::ALL
        .into_iter()
        .filter(move |&inner| can_contain(outer, inner))
}

/// Whether `inner` is reachable from `outer` through one or more
/// containment steps.
#[must_use]
pub fn can_nest(outer: EntityRole, inner: EntityRole) -> bool {
    let mut frontier = vec![outer];
    let mut seen = Vec::with_capacity(EntityRole::ALL.len());
    while let Some(role) = frontier.pop() {
        if can_contain(role, inner) {
            return true;
        }
        if seen.contains(&role) {
            continue;
        }
        seen.push(role);
        frontier.extend(containable(role).filter(|r| !seen.contains(r)));
    }
    false
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RoleRelation {
    pub outer: EntityRole,
    pub inner: EntityRole,
    pub can_contain: bool,
    pub influence: f32,
}

/// Every ordered role pair, precomputed for renderers and reports.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoleMatrix {
    entries: Vec<RoleRelation>,
}

impl RoleMatrix {
    #[must_use]
    pub fn build() -> Self {
        let entries = EntityRole::ALL
            .into_iter()
            .flat_map(|outer| {
                EntityRole::ALL.into_iter().map(move |inner| RoleRelation {
                    outer,
                    inner,
                    can_contain: can_contain(outer, inner),
                    influence: influence_strength(outer, inner),
                })
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[RoleRelation] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, outer: EntityRole, inner: EntityRole) -> Option<&RoleRelation> {
        self.entries
            .iter()
            .find(|e| e.outer == outer && e.inner == inner)
    }

    /// The strongest influencer of `inner` other than itself, if any.
    #[must_use]
    pub fn dominant_over(&self, inner: EntityRole) -> Option<EntityRole> {
        self.entries
            .iter()
            .filter(|e| e.inner == inner && e.outer != inner && e.can_contain)
            .max_by(|a, b| a.influence.total_cmp(&b.influence))
            .map(|e| e.outer)
    }
}

impl Default for RoleMatrix {
    fn default() -> Self {
        Self::build()
    }
}
