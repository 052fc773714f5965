use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::client::AlertClient;
use crate::client::ChainClient;
use crate::core::Alert;
use crate::core::Block;
use crate::core::BlockHeader;
use crate::core::Transaction;
use crate::AlertError;
use crate::ClientError;
use crate::Result;

/// In-memory chain whose tip is moved by the test
pub struct FakeChain {
    tip: AtomicU64,
    transactions: Mutex<HashMap<u64, Vec<Transaction>>>,
    balances: Mutex<HashMap<String, u128>>,
    unavailable: AtomicBool,
    header_calls: AtomicUsize,
}

impl FakeChain {
    pub fn new(tip: u64) -> Self {
        Self {
            tip: AtomicU64::new(tip),
            transactions: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            header_calls: AtomicUsize::new(0),
        }
    }

    /// Produces the next block, carrying `txs`
    pub fn mine(
        &self,
        txs: Vec<Transaction>,
    ) -> u64 {
        let height = self.tip.fetch_add(1, Ordering::SeqCst) + 1;
        self.transactions.lock().insert(height, txs);
        height
    }

    pub fn set_transactions(
        &self,
        height: u64,
        txs: Vec<Transaction>,
    ) {
        self.transactions.lock().insert(height, txs);
    }

    /// Balance reported for `address` at every produced height
    pub fn set_balance(
        &self,
        address: &str,
        wei: u128,
    ) {
        self.balances.lock().insert(address.to_ascii_lowercase(), wei);
    }

    /// Makes every call fail until switched back
    pub fn set_unavailable(
        &self,
        unavailable: bool,
    ) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn tip(&self) -> u64 {
        self.tip.load(Ordering::SeqCst)
    }

    pub fn header_calls(&self) -> usize {
        self.header_calls.load(Ordering::SeqCst)
    }

    fn check(
        &self,
        height: u64,
    ) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ClientError::Rpc {
                code: -32000,
                message: "node unavailable".into(),
            }
            .into());
        }
        if height > self.tip() {
            return Err(ClientError::BlockNotFound(height).into());
        }
        Ok(())
    }
}

fn header(number: u64) -> BlockHeader {
    BlockHeader {
        number,
        hash: format!("0xblock{number}"),
        parent_hash: format!("0xblock{}", number.saturating_sub(1)),
        timestamp: 1_700_000_000 + number * 12,
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn header_by_number(
        &self,
        height: Option<u64>,
    ) -> Result<BlockHeader> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);
        let number = height.unwrap_or_else(|| self.tip());
        self.check(number)?;
        Ok(header(number))
    }

    async fn block_by_number(
        &self,
        height: u64,
    ) -> Result<Block> {
        self.check(height)?;
        let transactions = self.transactions.lock().get(&height).cloned().unwrap_or_default();
        Ok(Block {
            header: header(height),
            transactions,
        })
    }

    async fn balance_at(
        &self,
        address: &str,
        height: u64,
    ) -> Result<u128> {
        self.check(height)?;
        Ok(self.balances.lock().get(&address.to_ascii_lowercase()).copied().unwrap_or_default())
    }
}

/// Destination that records every alert it accepts
pub struct RecordingAlertClient {
    name: String,
    fail: bool,
    delivered: Mutex<Vec<Alert>>,
    attempts: AtomicUsize,
    count_tx: watch::Sender<usize>,
}

impl RecordingAlertClient {
    pub fn new(name: &str) -> Self {
        Self::build(name, false)
    }

    /// Rejects every alert
    pub fn failing(name: &str) -> Self {
        Self::build(name, true)
    }

    fn build(
        name: &str,
        fail: bool,
    ) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            name: name.to_string(),
            fail,
            delivered: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            count_tx,
        }
    }

    /// Accepted alerts
    pub fn count(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.delivered.lock().clone()
    }

    /// Resolves once at least `n` alerts were accepted
    pub async fn wait_for(
        &self,
        n: usize,
    ) {
        let mut rx = self.count_tx.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

#[async_trait]
impl AlertClient for RecordingAlertClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AlertError::Delivery {
                client: self.name.clone(),
                reason: "destination unreachable".into(),
            }
            .into());
        }

        let count = {
            let mut delivered = self.delivered.lock();
            delivered.push(alert.clone());
            delivered.len()
        };
        self.count_tx.send_replace(count);
        Ok(())
    }
}
