//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ember_node::NodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            // The surface reports lookup misses and rejected submissions
            // alike as 400 with a plain-text message.
            RpcError::NotFound(_) | RpcError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

impl From<NodeError> for RpcError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Wallet(_)
            | NodeError::Ledger(_)
            | NodeError::Peer(_)
            | NodeError::BlockRejected => RpcError::BadRequest(e.to_string()),
            other => RpcError::Internal(other.to_string()),
        }
    }
}
