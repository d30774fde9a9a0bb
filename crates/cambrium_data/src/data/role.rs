use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Functional role of an entity. The set is closed; the dominance matrix is
/// defined over exactly these variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EntityRole {
    /// Top of the hierarchy, may contain any role.
    Core,
    /// Coordinates every role except `Core`.
    Control,
    Defense,
    Attack,
    Movement,
}

impl EntityRole {
    /// Every role in canonical order.
    pub const ALL: [EntityRole; 5] = [
        EntityRole::Core,
        EntityRole::Control,
        EntityRole::Defense,
        EntityRole::Attack,
        EntityRole::Movement,
    ];

    /// Dominance rank; higher dominates lower.
    #[must_use]
    pub const fn dominance(self) -> u8 {
        match self {
            EntityRole::Core => 3,
            EntityRole::Control => 2,
            EntityRole::Defense | EntityRole::Attack | EntityRole::Movement => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityRole::Core => "core",
            EntityRole::Control => "control",
            EntityRole::Defense => "defense",
            EntityRole::Attack => "attack",
            EntityRole::Movement => "movement",
        }
    }
}

impl fmt::Display for EntityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for EntityRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}
