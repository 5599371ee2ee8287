//! Prometheus metrics for the Ember node.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`] that the HTTP
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Current number of connected peers.
    pub peer_count: IntGauge,
    /// Index of the locally newest block.
    pub block_height: IntGauge,
    /// Current number of pending transactions in the pool.
    pub mempool_size: IntGauge,

    /// Total blocks mined by this node.
    pub blocks_mined: IntCounter,
    /// Total blocks accepted from peers (appends and replacements).
    pub blocks_received: IntCounter,
    /// Total transactions admitted to the pool from peers.
    pub transactions_received: IntCounter,
    /// Total wire messages dropped as unparseable.
    pub messages_dropped: IntCounter,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let peer_count = register_int_gauge_with_registry!(
            Opts::new("ember_peer_count", "Connected peers"),
            registry
        )
        .expect("failed to register peer_count gauge");

        let block_height = register_int_gauge_with_registry!(
            Opts::new("ember_block_height", "Index of the newest local block"),
            registry
        )
        .expect("failed to register block_height gauge");

        let mempool_size = register_int_gauge_with_registry!(
            Opts::new("ember_mempool_size", "Pending transactions in the pool"),
            registry
        )
        .expect("failed to register mempool_size gauge");

        let blocks_mined = register_int_counter_with_registry!(
            Opts::new("ember_blocks_mined_total", "Blocks mined by this node"),
            registry
        )
        .expect("failed to register blocks_mined counter");

        let blocks_received = register_int_counter_with_registry!(
            Opts::new(
                "ember_blocks_received_total",
                "Blocks accepted from peers"
            ),
            registry
        )
        .expect("failed to register blocks_received counter");

        let transactions_received = register_int_counter_with_registry!(
            Opts::new(
                "ember_transactions_received_total",
                "Transactions admitted to the pool from peers"
            ),
            registry
        )
        .expect("failed to register transactions_received counter");

        let messages_dropped = register_int_counter_with_registry!(
            Opts::new(
                "ember_messages_dropped_total",
                "Wire messages dropped as unparseable"
            ),
            registry
        )
        .expect("failed to register messages_dropped counter");

        Self {
            registry,
            peer_count,
            block_height,
            mempool_size,
            blocks_mined,
            blocks_received,
            transactions_received,
            messages_dropped,
        }
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
