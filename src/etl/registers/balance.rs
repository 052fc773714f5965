use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::client::ChainClient;
use crate::core::AccountBalance;
use crate::core::Network;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::core::TransitValue;
use crate::etl::ExtractorContext;
use crate::etl::ExtractorDefinition;
use crate::EtlError;
use crate::Result;

/// Emits the native balance of one address per height
pub struct AccountBalanceExtractor {
    network: Network,
    address: String,
    client: Arc<dyn ChainClient>,
}

impl AccountBalanceExtractor {
    pub fn new(
        network: Network,
        address: String,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            network,
            address,
            client,
        }
    }

    pub fn construct(context: ExtractorContext) -> Result<Box<dyn ExtractorDefinition>> {
        let address = context
            .address
            .ok_or(EtlError::MissingAddress(RegisterType::AccountBalance))?;
        Ok(Box::new(Self::new(context.network, address, context.client)))
    }
}

#[async_trait]
impl ExtractorDefinition for AccountBalanceExtractor {
    async fn extract(
        &self,
        height: Option<u64>,
    ) -> Result<TransitData> {
        let height = match height {
            Some(height) => height,
            None => self.client.header_by_number(None).await?.number,
        };
        let balance = self.client.balance_at(&self.address, height).await?;
        trace!(network = %self.network, address = %self.address, height, balance, "balance read");

        Ok(TransitData::new(
            self.network,
            RegisterType::AccountBalance,
            TransitValue::AccountBalance(AccountBalance {
                address: self.address.clone(),
                height,
                balance,
            }),
        ))
    }
}
