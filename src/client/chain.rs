use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use tracing::trace;

use crate::config::RpcConfig;
use crate::core::Block;
use crate::core::BlockHeader;
use crate::core::Network;
use crate::core::Transaction;
use crate::ClientError;
use crate::Error;
use crate::Result;

/// Read access to a chain node
///
/// Handles are shared read-only between extractors of the same network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Header at `height`, or the chain tip when `height` is `None`
    async fn header_by_number(
        &self,
        height: Option<u64>,
    ) -> Result<BlockHeader>;

    /// Full block with transactions at `height`
    async fn block_by_number(
        &self,
        height: u64,
    ) -> Result<Block>;

    /// Native balance of `address` in wei as of `height`
    async fn balance_at(
        &self,
        address: &str,
        height: u64,
    ) -> Result<u128>;
}

/// Per network client table injected into the ETL manager
#[derive(Clone, Default)]
pub struct ChainClients {
    clients: HashMap<Network, Arc<dyn ChainClient>>,
}

impl ChainClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON-RPC clients for both networks
    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let mut clients = Self::new();
        for network in [Network::Layer1, Network::Layer2] {
            let client = JsonRpcClient::new(network, config.url(network), timeout)?;
            clients = clients.with_client(network, Arc::new(client));
        }
        Ok(clients)
    }

    pub fn with_client(
        mut self,
        network: Network,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        self.clients.insert(network, client);
        self
    }

    pub fn get(
        &self,
        network: Network,
    ) -> Result<Arc<dyn ChainClient>> {
        self.clients
            .get(&network)
            .cloned()
            .ok_or_else(|| ClientError::UnknownNetwork(network.to_string()).into())
    }
}

/// Error message nodes return for heights they have not produced
const HEADER_NOT_FOUND: &str = "header not found";

/// `eth_getBlockByNumber` and `eth_getBalance` over HTTP JSON-RPC
pub struct JsonRpcClient {
    network: Network,
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(
        network: Network,
        url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            network,
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        trace!(network = %self.network, method, id, "rpc request");

        let response = self.http.post(&self.url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                client: format!("{} rpc", self.network),
                status: response.status().as_u16(),
            }
            .into());
        }

        let body: RpcResponse<T> = response.json().await?;
        if let Some(err) = body.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            }
            .into());
        }
        Ok(body.result)
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn header_by_number(
        &self,
        height: Option<u64>,
    ) -> Result<BlockHeader> {
        let tag = block_tag(height);
        let raw: Option<RawHeader> = self.call("eth_getBlockByNumber", json!([tag, false])).await?;
        match raw {
            Some(raw) => raw.into_header(),
            None => Err(ClientError::BlockNotFound(height.unwrap_or_default()).into()),
        }
    }

    async fn block_by_number(
        &self,
        height: u64,
    ) -> Result<Block> {
        let raw: Option<RawBlock> = self
            .call("eth_getBlockByNumber", json!([block_tag(Some(height)), true]))
            .await?;
        match raw {
            Some(raw) => raw.into_block(),
            None => Err(ClientError::BlockNotFound(height).into()),
        }
    }

    async fn balance_at(
        &self,
        address: &str,
        height: u64,
    ) -> Result<u128> {
        let raw: Option<String> = match self
            .call("eth_getBalance", json!([address, block_tag(Some(height))]))
            .await
        {
            Err(Error::Client(ClientError::Rpc { message, .. })) if message == HEADER_NOT_FOUND => {
                return Err(ClientError::BlockNotFound(height).into());
            }
            other => other?,
        };
        match raw {
            Some(raw) => parse_quantity(&raw),
            None => Err(ClientError::BlockNotFound(height).into()),
        }
    }
}

fn block_tag(height: Option<u64>) -> String {
    match height {
        Some(h) => format!("{h:#x}"),
        None => "latest".to_string(),
    }
}

/// Decodes a `0x` prefixed hex quantity
pub(crate) fn parse_quantity(s: &str) -> Result<u128> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ClientError::Decode(format!("invalid quantity {s}: {e}")).into())
}

fn parse_u64(s: &str) -> Result<u64> {
    let value = parse_quantity(s)?;
    u64::try_from(value).map_err(|_| ClientError::Decode(format!("quantity {s} overflows u64")).into())
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    number: String,
    hash: String,
    parent_hash: String,
    timestamp: String,
}

impl RawHeader {
    fn into_header(self) -> Result<BlockHeader> {
        Ok(BlockHeader {
            number: parse_u64(&self.number)?,
            hash: self.hash,
            parent_hash: self.parent_hash,
            timestamp: parse_u64(&self.timestamp)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    #[serde(flatten)]
    header: RawHeader,
    #[serde(default)]
    transactions: Vec<RawTransaction>,
}

impl RawBlock {
    fn into_block(self) -> Result<Block> {
        let header = self.header.into_header()?;
        let transactions = self
            .transactions
            .into_iter()
            .map(|tx| tx.into_transaction(header.number))
            .collect::<Result<Vec<_>>>()?;
        Ok(Block {
            header,
            transactions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
}

impl RawTransaction {
    fn into_transaction(
        self,
        block_number: u64,
    ) -> Result<Transaction> {
        Ok(Transaction {
            value: parse_quantity(&self.value)?,
            hash: self.hash,
            block_number,
            from: self.from,
            to: self.to,
        })
    }
}
