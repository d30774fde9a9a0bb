use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single trait change fired by a confirmation milestone.
///
/// Events are immutable once created and only ever appended to an
/// organism's history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    /// Organism the change applies to.
    pub organism_id: Uuid,
    /// Fully qualified trait key (`category.trait`).
    pub trait_key: String,
    /// Value before the mutation.
    pub old_value: String,
    /// Value after the mutation.
    pub new_value: String,
    /// Confirmation count observed when the milestone fired.
    pub confirmations: u64,
    /// Threshold of the tier that fired.
    pub threshold: u64,
}

impl MutationEvent {
    /// True when the mutation actually replaced the value.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old_value != self.new_value
    }
}
