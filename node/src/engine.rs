//! Peer synchronization engine.
//!
//! Runs the gossip protocol over the live peer set: answers chain and
//! mempool requests, reconciles peer-advertised chains against the local
//! one, and re-broadcasts accepted state. All handlers are cooperative
//! tasks sharing the chain/mempool behind one lock; none of them blocks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use ember_ledger::Block;

use crate::metrics::NodeMetrics;
use crate::node::NodeState;
use crate::registry::{PeerId, PeerRegistry};
use crate::wire::{PeerMessage, KEEPALIVE_PAYLOAD};

/// What chain reconciliation decided to do with a received block list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Nothing to do: empty or malformed response, or the local chain is
    /// already at least as long.
    Ignore,
    /// The received last block extends the local head directly.
    Append,
    /// A single block that does not chain from the local head: ask the
    /// sender for its full chain instead of guessing.
    RequestFullChain,
    /// A longer chain that does not extend the local head: attempt a
    /// wholesale replacement.
    Replace,
}

/// Decide how to reconcile a received block list against the local newest
/// block. Pure; the effects (append, replace, request) run against live
/// state afterwards and revalidate everything.
pub fn reconcile_action(received: &[Block], local_newest: &Block) -> ReconcileAction {
    let Some(last) = received.last() else {
        return ReconcileAction::Ignore;
    };
    if !last.has_valid_structure() {
        return ReconcileAction::Ignore;
    }
    if last.index <= local_newest.index {
        // Local chain is at least as long; local wins by default.
        return ReconcileAction::Ignore;
    }
    if last.previous_hash == local_newest.hash {
        ReconcileAction::Append
    } else if received.len() == 1 {
        ReconcileAction::RequestFullChain
    } else {
        ReconcileAction::Replace
    }
}

/// The gossip engine: owns the peer registry and drives the protocol.
pub struct SyncEngine {
    registry: RwLock<PeerRegistry>,
    state: Arc<RwLock<NodeState>>,
    metrics: Arc<NodeMetrics>,
    keepalive_interval: Duration,
    mempool_sync_delay: Duration,
}

impl SyncEngine {
    pub fn new(
        state: Arc<RwLock<NodeState>>,
        metrics: Arc<NodeMetrics>,
        keepalive_interval: Duration,
        mempool_sync_delay: Duration,
    ) -> Self {
        Self {
            registry: RwLock::new(PeerRegistry::new()),
            state,
            metrics,
            keepalive_interval,
            mempool_sync_delay,
        }
    }

    /// Register a new connection and run the connect-time protocol:
    /// immediately request the peer's newest block, request its mempool
    /// after a short delay, and start the keep-alive timer. Identical for
    /// accepted and initiated connections.
    pub async fn register_peer(
        self: &Arc<Self>,
    ) -> (PeerId, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (peer_id, outbox) = {
            let mut registry = self.registry.write().await;
            let added = registry.add();
            self.metrics.peer_count.set(registry.len() as i64);
            added
        };
        tracing::info!(peer = peer_id, "peer connected");

        // Keep-alive: periodically send an empty payload so idle
        // connections are not reclaimed. The handle is held by the
        // registry and aborted at teardown.
        let engine = Arc::clone(self);
        let keepalive = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.keepalive_interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                let registry = engine.registry.read().await;
                if !registry.send_to(peer_id, KEEPALIVE_PAYLOAD.to_string()) {
                    break;
                }
            }
        });
        {
            let mut registry = self.registry.write().await;
            registry.set_keepalive(peer_id, keepalive);
        }

        self.send_to(peer_id, &PeerMessage::GetLatest).await;

        // Mempool sync is sequenced after the chain request by a timer
        // only; it does not wait for the chain response.
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(engine.mempool_sync_delay).await;
            engine.send_to(peer_id, &PeerMessage::RequestMempool).await;
        });

        (peer_id, outbox)
    }

    /// Remove a peer connection. Idempotent; cancels the keep-alive timer.
    pub async fn remove_peer(&self, peer_id: PeerId) {
        let removed = {
            let mut registry = self.registry.write().await;
            let removed = registry.remove(peer_id);
            self.metrics.peer_count.set(registry.len() as i64);
            removed
        };
        if removed {
            tracing::info!(peer = peer_id, "peer disconnected");
        }
    }

    pub async fn peer_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Dispatch one raw wire message from a peer. Unparseable messages are
    /// dropped without closing the connection.
    pub async fn handle_message(&self, peer_id: PeerId, raw: &str) {
        let message = match PeerMessage::parse(raw) {
            Ok(message) => message,
            Err(_) => {
                self.metrics.messages_dropped.inc();
                tracing::trace!(peer = peer_id, len = raw.len(), "dropping unparseable message");
                return;
            }
        };

        match message {
            PeerMessage::GetLatest => {
                let newest = {
                    let state = self.state.read().await;
                    state.chain.newest_block().clone()
                };
                self.send_to(peer_id, &PeerMessage::BlockchainResponse(vec![newest]))
                    .await;
            }
            PeerMessage::GetAll => {
                let blocks = {
                    let state = self.state.read().await;
                    state.chain.blocks().to_vec()
                };
                self.send_to(peer_id, &PeerMessage::BlockchainResponse(blocks))
                    .await;
            }
            PeerMessage::BlockchainResponse(blocks) => {
                self.reconcile(peer_id, blocks).await;
            }
            PeerMessage::RequestMempool => {
                let pool = {
                    let state = self.state.read().await;
                    state.mempool.transactions().to_vec()
                };
                self.send_to(peer_id, &PeerMessage::MempoolResponse(pool))
                    .await;
            }
            PeerMessage::MempoolResponse(txs) => {
                // Each transaction is ingested on its own; one rejection
                // does not abort the rest.
                for tx in txs {
                    let mut state = self.state.write().await;
                    let utxos = state.chain.utxos().to_vec();
                    match state.mempool.add(tx, &utxos) {
                        Ok(()) => {
                            self.metrics.transactions_received.inc();
                            self.metrics.mempool_size.set(state.mempool.len() as i64);
                        }
                        Err(e) => {
                            tracing::debug!(peer = peer_id, error = %e, "rejected peer transaction");
                        }
                    }
                }
            }
        }
    }

    /// Chain reconciliation, run on every `BLOCKCHAIN_RESPONSE`.
    async fn reconcile(&self, peer_id: PeerId, blocks: Vec<Block>) {
        let action = {
            let state = self.state.read().await;
            reconcile_action(&blocks, state.chain.newest_block())
        };

        match action {
            ReconcileAction::Ignore => {
                tracing::debug!(peer = peer_id, received = blocks.len(), "no chain action needed");
            }
            ReconcileAction::Append => {
                let Some(block) = blocks.last().cloned() else {
                    return;
                };
                let appended = {
                    let mut state = self.state.write().await;
                    if state.chain.add_block(block) {
                        let utxos = state.chain.utxos().to_vec();
                        state.mempool.update(&utxos);
                        self.metrics.blocks_received.inc();
                        self.metrics.block_height.set(state.chain.height() as i64);
                        self.metrics.mempool_size.set(state.mempool.len() as i64);
                        true
                    } else {
                        false
                    }
                };
                if appended {
                    self.broadcast_latest().await;
                }
            }
            ReconcileAction::RequestFullChain => {
                tracing::info!(peer = peer_id, "peer is ahead; requesting its full chain");
                self.send_to(peer_id, &PeerMessage::GetAll).await;
            }
            ReconcileAction::Replace => {
                let mut state = self.state.write().await;
                if state.chain.replace_chain(blocks) {
                    let utxos = state.chain.utxos().to_vec();
                    state.mempool.update(&utxos);
                    self.metrics.blocks_received.inc();
                    self.metrics.block_height.set(state.chain.height() as i64);
                    self.metrics.mempool_size.set(state.mempool.len() as i64);
                }
            }
        }
    }

    /// Send the locally newest block to every peer.
    pub async fn broadcast_latest(&self) {
        let newest = {
            let state = self.state.read().await;
            state.chain.newest_block().clone()
        };
        let message = PeerMessage::BlockchainResponse(vec![newest]).to_json();
        self.registry.read().await.broadcast(&message);
    }

    /// Send the full local mempool to every peer.
    pub async fn broadcast_mempool(&self) {
        let pool = {
            let state = self.state.read().await;
            state.mempool.transactions().to_vec()
        };
        let message = PeerMessage::MempoolResponse(pool).to_json();
        self.registry.read().await.broadcast(&message);
    }

    async fn send_to(&self, peer_id: PeerId, message: &PeerMessage) {
        let registry = self.registry.read().await;
        if !registry.send_to(peer_id, message.to_json()) {
            tracing::debug!(peer = peer_id, "dropping message to vanished peer");
        }
    }
}
