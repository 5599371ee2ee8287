//! HTTP surface for the Ember node.
//!
//! A thin CRUD wrapper: every route is a direct pass-through to one node
//! operation. Chain and transaction queries, wallet balance/address, peer
//! registration, payment submission, mining, and Prometheus metrics.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::router;
