//! Ember full node.
//!
//! The node is the central coordinator:
//! - runs the peer synchronization engine (gossip over WebSocket peers)
//! - routes peer-supplied blocks and transactions into the chain/mempool
//! - mines blocks paying the local wallet and broadcasts them
//! - builds wallet spends and feeds them into the pool
//! - exposes its operations to the HTTP surface

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod peer;
pub mod registry;
pub mod wire;

pub use config::NodeConfig;
pub use engine::SyncEngine;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{EmberNode, NodeState};
pub use peer::{connect, peer_router};
pub use registry::{PeerId, PeerRegistry};
pub use wire::PeerMessage;
