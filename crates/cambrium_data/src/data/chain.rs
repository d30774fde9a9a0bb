use serde::{Deserialize, Serialize};

/// Block metadata supplied by a chain data provider.
///
/// Only `nonce` (seed source) and `confirmations` (milestones) drive the
/// engine; `height` and `hash` travel along for provenance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockDescriptor {
    pub height: u64,
    pub hash: String,
    pub nonce: u32,
    pub confirmations: u64,
}

impl BlockDescriptor {
    #[must_use]
    pub fn new(height: u64, hash: impl Into<String>, nonce: u32, confirmations: u64) -> Self {
        Self {
            height,
            hash: hash.into(),
            nonce,
            confirmations,
        }
    }

    /// Returns a copy of this block with an updated confirmation count.
    #[must_use]
    pub fn with_confirmations(&self, confirmations: u64) -> Self {
        Self {
            confirmations,
            ..self.clone()
        }
    }
}
