//! Route table for the HTTP surface.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ember_node::EmberNode;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Build the REST router. The peer WebSocket route is mounted separately
/// (same server, different state) by the daemon.
pub fn router(node: Arc<EmberNode>) -> Router {
    Router::new()
        .route(
            "/blocks",
            get(handlers::list_blocks).post(handlers::mine_block),
        )
        .route("/blocks/:hash", get(handlers::block_by_hash))
        .route("/peers", post(handlers::add_peer))
        .route("/me/balance", get(handlers::my_balance))
        .route("/me/address", get(handlers::my_address))
        .route(
            "/transactions",
            get(handlers::list_mempool).post(handlers::send_transaction),
        )
        .route("/transactions/:id", get(handlers::transaction_by_id))
        .route("/address/:address", get(handlers::address_balance))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}
