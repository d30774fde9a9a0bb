//! # Cambrium Data
//!
//! Plain, serializable records shared by the engine and its consumers.
//! Nothing here holds generator state; every type can be handed to a
//! renderer or a persistence layer as-is.

pub mod data;

pub use data::chain::BlockDescriptor;
pub use data::event::MutationEvent;
pub use data::formation::Position;
pub use data::role::{EntityRole, ParseRoleError};
pub use data::taxonomy::{CategoryDefinition, Rarity, TraitDomain};
