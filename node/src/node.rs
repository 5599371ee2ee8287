//! Node orchestration.
//!
//! Ties the wallet, chain, mempool, and synchronization engine together and
//! exposes the operations the HTTP surface calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use ember_ledger::{find_block, Block, Chain, Mempool};
use ember_transactions::Transaction;
use ember_types::{Address, Amount, Timestamp, TxId};
use ember_wallet::{balance_of, Wallet};

use crate::config::NodeConfig;
use crate::engine::SyncEngine;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::peer;

/// Chain and pending pool behind one lock: handlers serialize at state
/// access, so no partial update is ever observable.
pub struct NodeState {
    pub chain: Chain,
    pub mempool: Mempool,
}

/// A running Ember node.
pub struct EmberNode {
    config: NodeConfig,
    wallet: Wallet,
    state: Arc<RwLock<NodeState>>,
    engine: Arc<SyncEngine>,
    metrics: Arc<NodeMetrics>,
}

impl EmberNode {
    /// Build a node from its configuration. Fails fatally if the wallet
    /// identity cannot be read or created — the node cannot operate without
    /// a signing key.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let wallet = Wallet::open(&config.wallet_key_path())?;
        tracing::info!(address = %wallet.address(), "wallet ready");

        let state = Arc::new(RwLock::new(NodeState {
            chain: Chain::new(),
            mempool: Mempool::new(),
        }));
        let metrics = Arc::new(NodeMetrics::new());
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&state),
            Arc::clone(&metrics),
            Duration::from_secs(config.keepalive_interval_secs),
            Duration::from_millis(config.mempool_sync_delay_ms),
        ));

        Ok(Self {
            config,
            wallet,
            state,
            engine,
            metrics,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<SyncEngine> {
        Arc::clone(&self.engine)
    }

    pub fn metrics(&self) -> Arc<NodeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The wallet's address (re-derived from the key at startup).
    pub fn wallet_address(&self) -> &Address {
        self.wallet.address()
    }

    /// Spendable balance of the local wallet.
    pub async fn wallet_balance(&self) -> Amount {
        let state = self.state.read().await;
        self.wallet.balance(state.chain.utxos())
    }

    /// Balance of an arbitrary address.
    pub async fn balance_of(&self, address: &Address) -> Amount {
        let state = self.state.read().await;
        balance_of(address, state.chain.utxos())
    }

    pub async fn blocks(&self) -> Vec<Block> {
        self.state.read().await.chain.blocks().to_vec()
    }

    pub async fn find_block(&self, hash: &str) -> Option<Block> {
        self.state.read().await.chain.find_block(hash).cloned()
    }

    pub async fn find_transaction(&self, id: &TxId) -> Option<Transaction> {
        self.state.read().await.chain.find_transaction(id).cloned()
    }

    pub async fn mempool_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.mempool.transactions().to_vec()
    }

    /// Dial an outbound peer.
    pub async fn connect_to_peer(&self, url: &str) -> Result<(), NodeError> {
        peer::connect(url, self.engine()).await
    }

    /// Mine the next block: coinbase to the local wallet plus the current
    /// pool. The proof-of-work scan runs off the async executor; the result
    /// is revalidated on append, so a chain that advanced mid-mine simply
    /// rejects the stale block.
    pub async fn create_block(&self) -> Result<Block, NodeError> {
        let (index, previous_hash, difficulty, pool) = {
            let state = self.state.read().await;
            let prev = state.chain.newest_block();
            (
                prev.index + 1,
                prev.hash.clone(),
                state.chain.next_difficulty(),
                state.mempool.transactions().to_vec(),
            )
        };

        let coinbase = Transaction::coinbase(self.wallet.address().clone(), index, Timestamp::now());
        let mut batch = vec![coinbase];
        batch.extend(pool);

        let block = tokio::task::spawn_blocking(move || {
            find_block(index, previous_hash, Timestamp::now(), batch, difficulty)
        })
        .await
        .map_err(|e| NodeError::Internal(format!("mining task failed: {e}")))?;

        {
            let mut state = self.state.write().await;
            if !state.chain.add_block(block.clone()) {
                return Err(NodeError::BlockRejected);
            }
            let utxos = state.chain.utxos().to_vec();
            state.mempool.update(&utxos);
            self.metrics.blocks_mined.inc();
            self.metrics.block_height.set(state.chain.height() as i64);
            self.metrics.mempool_size.set(state.mempool.len() as i64);
        }
        tracing::info!(index = block.index, hash = %block.hash, "mined block");

        self.engine.broadcast_latest().await;
        Ok(block)
    }

    /// Build a wallet spend, admit it to the pool, and broadcast the pool.
    pub async fn send_payment(
        &self,
        receiver: Address,
        amount: Amount,
    ) -> Result<Transaction, NodeError> {
        let tx = {
            let mut state = self.state.write().await;
            let utxos = state.chain.utxos().to_vec();
            let tx = self.wallet.create_transaction(
                &receiver,
                amount,
                &utxos,
                state.mempool.transactions(),
            )?;
            state.mempool.add(tx.clone(), &utxos)?;
            self.metrics.mempool_size.set(state.mempool.len() as i64);
            tx
        };
        tracing::info!(id = %tx.id, %amount, "submitted payment");

        self.engine.broadcast_mempool().await;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_node() -> (EmberNode, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (EmberNode::new(config).unwrap(), dir)
    }

    #[tokio::test]
    async fn new_node_starts_at_genesis() {
        let (node, _dir) = test_node();
        assert_eq!(node.blocks().await.len(), 1);
        assert_eq!(node.wallet_balance().await, Amount::ZERO);
        assert!(node.mempool_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn mining_credits_the_wallet() {
        let (node, _dir) = test_node();
        let block = node.create_block().await.unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(node.wallet_balance().await, Amount::new(50));
        assert_eq!(node.metrics.blocks_mined.get(), 1);
    }

    #[tokio::test]
    async fn payment_flows_through_pool_and_block() {
        let (node, _dir) = test_node();
        node.create_block().await.unwrap();

        let receiver = Address::new(format!("04{}", "b".repeat(128)));
        let tx = node
            .send_payment(receiver.clone(), Amount::new(20))
            .await
            .unwrap();
        assert_eq!(node.mempool_transactions().await.len(), 1);
        assert!(node.find_transaction(&tx.id).await.is_none());

        // Mining confirms the payment and clears the pool.
        node.create_block().await.unwrap();
        assert!(node.mempool_transactions().await.is_empty());
        assert!(node.find_transaction(&tx.id).await.is_some());
        assert_eq!(node.balance_of(&receiver).await, Amount::new(20));
        assert_eq!(node.wallet_balance().await, Amount::new(80));
    }

    #[tokio::test]
    async fn overdraw_is_rejected() {
        let (node, _dir) = test_node();
        node.create_block().await.unwrap();
        let receiver = Address::new(format!("04{}", "b".repeat(128)));
        let err = node
            .send_payment(receiver, Amount::new(51))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Wallet(_)));
    }

    #[tokio::test]
    async fn block_lookup_by_hash() {
        let (node, _dir) = test_node();
        let block = node.create_block().await.unwrap();
        assert!(node.find_block(&block.hash).await.is_some());
        assert!(node.find_block("missing").await.is_none());
    }
}
