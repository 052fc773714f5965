use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::client::ChainClient;
use crate::core::Network;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::core::TransitValue;
use crate::etl::ExtractorContext;
use crate::etl::ExtractorDefinition;
use crate::Result;

/// Emits one full block per height
///
/// The header is resolved first so a tip request (`None`) pins the height
/// the block is then fetched at.
pub struct BlockExtractor {
    network: Network,
    client: Arc<dyn ChainClient>,
}

impl BlockExtractor {
    pub fn new(
        network: Network,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        Self { network, client }
    }

    pub fn construct(context: ExtractorContext) -> Result<Box<dyn ExtractorDefinition>> {
        Ok(Box::new(Self::new(context.network, context.client)))
    }
}

#[async_trait]
impl ExtractorDefinition for BlockExtractor {
    async fn extract(
        &self,
        height: Option<u64>,
    ) -> Result<TransitData> {
        let header = self.client.header_by_number(height).await?;
        let number = height.unwrap_or(header.number);
        let block = self.client.block_by_number(number).await?;
        trace!(network = %self.network, height = number, txs = block.transactions.len(), "block extracted");

        Ok(TransitData::new(
            self.network,
            RegisterType::Block,
            TransitValue::Block(block),
        ))
    }
}
