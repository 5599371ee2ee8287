//! Request handlers and their DTOs.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ember_ledger::Block;
use ember_node::EmberNode;
use ember_transactions::Transaction;
use ember_types::{Address, Amount, TxId};

use crate::error::RpcError;

// ── DTOs ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddPeerRequest {
    pub peer: String,
}

#[derive(Deserialize)]
pub struct SendTransactionRequest {
    pub address: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: u64,
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub address: String,
}

// ── Chain ────────────────────────────────────────────────────────────────

pub async fn list_blocks(State(node): State<Arc<EmberNode>>) -> Json<Vec<Block>> {
    Json(node.blocks().await)
}

pub async fn mine_block(State(node): State<Arc<EmberNode>>) -> Result<Json<Block>, RpcError> {
    let block = node.create_block().await?;
    Ok(Json(block))
}

pub async fn block_by_hash(
    State(node): State<Arc<EmberNode>>,
    Path(hash): Path<String>,
) -> Result<Json<Block>, RpcError> {
    node.find_block(&hash)
        .await
        .map(Json)
        .ok_or_else(|| RpcError::NotFound("Block not found".into()))
}

// ── Peers ────────────────────────────────────────────────────────────────

pub async fn add_peer(
    State(node): State<Arc<EmberNode>>,
    Json(request): Json<AddPeerRequest>,
) -> Result<StatusCode, RpcError> {
    node.connect_to_peer(&request.peer).await?;
    Ok(StatusCode::OK)
}

// ── Wallet ───────────────────────────────────────────────────────────────

pub async fn my_balance(State(node): State<Arc<EmberNode>>) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: node.wallet_balance().await.raw(),
    })
}

pub async fn my_address(State(node): State<Arc<EmberNode>>) -> Json<AddressResponse> {
    Json(AddressResponse {
        address: node.wallet_address().to_string(),
    })
}

pub async fn address_balance(
    State(node): State<Arc<EmberNode>>,
    Path(address): Path<String>,
) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: node.balance_of(&Address::new(address)).await.raw(),
    })
}

// ── Transactions ─────────────────────────────────────────────────────────

pub async fn list_mempool(State(node): State<Arc<EmberNode>>) -> Json<Vec<Transaction>> {
    Json(node.mempool_transactions().await)
}

pub async fn send_transaction(
    State(node): State<Arc<EmberNode>>,
    Json(request): Json<SendTransactionRequest>,
) -> Result<Json<Transaction>, RpcError> {
    let tx = node
        .send_payment(Address::new(request.address), Amount::new(request.amount))
        .await?;
    Ok(Json(tx))
}

pub async fn transaction_by_id(
    State(node): State<Arc<EmberNode>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, RpcError> {
    node.find_transaction(&TxId::new(id))
        .await
        .map(Json)
        .ok_or_else(|| RpcError::NotFound("Transaction not found".into()))
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(node): State<Arc<EmberNode>>) -> String {
    node.metrics().encode()
}
