//! Boundary to the chain data provider.
//!
//! Fetching block metadata is someone else's job; the engine only needs a
//! descriptor. The trait is async so network-backed hosts can implement it
//! directly.

use anyhow::Result;
use async_trait::async_trait;
use cambrium_data::BlockDescriptor;
use std::collections::BTreeMap;

#[async_trait]
pub trait ChainDataProvider {
    /// Most recent block known to the provider.
    async fn latest_block(&self) -> Result<BlockDescriptor>;

    /// Current confirmation count for the block at `height`.
    async fn confirmations(&self, height: u64) -> Result<u64>;
}

/// In-memory provider over a fixed set of blocks.
#[derive(Debug, Clone, Default)]
pub struct StaticChainProvider {
    blocks: BTreeMap<u64, BlockDescriptor>,
}

impl StaticChainProvider {
    pub fn new<I: IntoIterator<Item = BlockDescriptor>>(blocks: I) -> Self {
        Self {
            blocks: blocks.into_iter().map(|b| (b.height, b)).collect(),
        }
    }

    /// Replaces the confirmation count of a known block.
    pub fn set_confirmations(&mut self, height: u64, confirmations: u64) -> Result<()> {
        let block = self
            .blocks
            .get_mut(&height)
            .ok_or_else(|| anyhow::anyhow!("Unknown block height {}", height))?;
        block.confirmations = confirmations;
        Ok(())
    }
}

#[async_trait]
impl ChainDataProvider for StaticChainProvider {
    async fn latest_block(&self) -> Result<BlockDescriptor> {
        self.blocks
            .values()
            .next_back()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Provider holds no blocks"))
    }

    async fn confirmations(&self, height: u64) -> Result<u64> {
        self.blocks
            .get(&height)
            .map(|b| b.confirmations)
            .ok_or_else(|| anyhow::anyhow!("Unknown block height {}", height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_block_is_highest() {
        let provider = StaticChainProvider::new([
            BlockDescriptor::new(10, "aa", 1, 5),
            BlockDescriptor::new(12, "bb", 2, 3),
            BlockDescriptor::new(11, "cc", 3, 4),
        ]);
        let latest = provider.latest_block().await.unwrap();
        assert_eq!(latest.height, 12);
        assert_eq!(latest.nonce, 2);
    }

    #[tokio::test]
    async fn test_empty_provider_errors() {
        let provider = StaticChainProvider::default();
        assert!(provider.latest_block().await.is_err());
        assert!(provider.confirmations(1).await.is_err());
    }

    #[tokio::test]
    async fn test_confirmations_update() {
        let mut provider = StaticChainProvider::new([BlockDescriptor::new(1, "aa", 1, 0)]);
        provider.set_confirmations(1, 50_000).unwrap();
        assert_eq!(provider.confirmations(1).await.unwrap(), 50_000);
        assert!(provider.set_confirmations(2, 1).is_err());
    }
}
