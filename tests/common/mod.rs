use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chainwatch::alert::RoutingDirectory;
use chainwatch::client::AlertClient;
use chainwatch::client::ChainClient;
use chainwatch::client::ChainClients;
use chainwatch::config::Settings;
use chainwatch::core::Alert;
use chainwatch::core::AlertPolicy;
use chainwatch::core::Block;
use chainwatch::core::BlockHeader;
use chainwatch::core::Network;
use chainwatch::core::Severity;
use chainwatch::core::Transaction;
use chainwatch::engine::heuristics::default_table;
use chainwatch::etl::registers::default_registry;
use chainwatch::subsystem::Dependencies;
use chainwatch::subsystem::SessionRequest;
use chainwatch::subsystem::Subsystem;
use chainwatch::ClientError;
use chainwatch::Result;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

pub const POLL_INTERVAL_MS: u64 = 100;

/// Chain node double: the test decides when blocks appear
pub struct SyntheticChain {
    tip: AtomicU64,
    transactions: Mutex<HashMap<u64, Vec<Transaction>>>,
    balances: Mutex<HashMap<String, u128>>,
}

impl SyntheticChain {
    pub fn new(tip: u64) -> Self {
        Self {
            tip: AtomicU64::new(tip),
            transactions: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Balance reported for `address` at every produced height from now on
    pub fn set_balance(
        &self,
        address: &str,
        wei: u128,
    ) {
        self.balances.lock().insert(address.to_ascii_lowercase(), wei);
    }

    pub fn mine(
        &self,
        transactions: Vec<Transaction>,
    ) -> u64 {
        let height = self.tip.fetch_add(1, Ordering::SeqCst) + 1;
        self.transactions.lock().insert(height, transactions);
        height
    }

    pub fn tip(&self) -> u64 {
        self.tip.load(Ordering::SeqCst)
    }

    fn header(
        &self,
        number: u64,
    ) -> Result<BlockHeader> {
        if number > self.tip() {
            return Err(ClientError::BlockNotFound(number).into());
        }
        Ok(BlockHeader {
            number,
            hash: format!("0x{number:064x}"),
            parent_hash: format!("0x{:064x}", number.saturating_sub(1)),
            timestamp: 1_700_000_000 + number * 12,
        })
    }
}

#[async_trait]
impl ChainClient for SyntheticChain {
    async fn header_by_number(
        &self,
        height: Option<u64>,
    ) -> Result<BlockHeader> {
        self.header(height.unwrap_or_else(|| self.tip()))
    }

    async fn block_by_number(
        &self,
        height: u64,
    ) -> Result<Block> {
        Ok(Block {
            header: self.header(height)?,
            transactions: self.transactions.lock().get(&height).cloned().unwrap_or_default(),
        })
    }

    async fn balance_at(
        &self,
        address: &str,
        height: u64,
    ) -> Result<u128> {
        self.header(height)?;
        Ok(self.balances.lock().get(&address.to_ascii_lowercase()).copied().unwrap_or_default())
    }
}

/// Destination double recording what it was sent
pub struct Sink {
    name: String,
    alerts: Mutex<Vec<Alert>>,
    count: watch::Sender<usize>,
}

impl Sink {
    pub fn new(name: &str) -> Arc<Self> {
        let (count, _) = watch::channel(0);
        Arc::new(Self {
            name: name.into(),
            alerts: Mutex::new(vec![]),
            count,
        })
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub async fn wait_for(
        &self,
        n: usize,
    ) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|c| *c >= n).await;
    }
}

#[async_trait]
impl AlertClient for Sink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()> {
        let len = {
            let mut alerts = self.alerts.lock();
            alerts.push(alert.clone());
            alerts.len()
        };
        self.count.send_replace(len);
        Ok(())
    }
}

pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.etl.l1_poll_interval_ms = POLL_INTERVAL_MS;
    settings.etl.l2_poll_interval_ms = POLL_INTERVAL_MS;
    settings
}

pub fn chain_clients(chain: Arc<SyntheticChain>) -> ChainClients {
    ChainClients::new().with_client(Network::Layer1, chain)
}

/// Subsystem over `chain` routing High alerts to `sink`
pub fn subsystem(
    chain: Arc<SyntheticChain>,
    sink: Arc<Sink>,
) -> Subsystem {
    let deps = Dependencies {
        registry: default_registry(),
        heuristics: default_table(),
        clients: chain_clients(chain),
        routing: RoutingDirectory::new().with_client(Severity::High, sink),
    };
    Subsystem::new(&settings(), deps)
}

pub fn session(
    heuristic_type: &str,
    params: Value,
    cooldown_seconds: u64,
) -> SessionRequest {
    SessionRequest {
        network: Network::Layer1,
        heuristic_type: heuristic_type.into(),
        start_height: None,
        end_height: None,
        alert_policy: AlertPolicy {
            message: "integration alert".into(),
            severity: Severity::High,
            cooldown_seconds,
        },
        heuristic_params: params,
    }
}

pub fn tx(
    block_number: u64,
    to: Option<&str>,
    value: u128,
) -> Transaction {
    Transaction {
        hash: format!("0x{block_number:x}{value:x}"),
        block_number,
        from: "0xfeed".into(),
        to: to.map(str::to_string),
        value,
    }
}
