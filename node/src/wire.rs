//! Peer wire protocol.
//!
//! Every message between peers is one newline-free JSON text of the shape
//! `{"type": "<ENUM>", "data": <payload|null>}`. The enum is closed: a
//! message with an unknown tag fails to deserialize and is dropped by the
//! dispatcher without closing the connection.

use ember_ledger::Block;
use ember_transactions::Transaction;
use serde::{Deserialize, Serialize};

/// Top-level peer message envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerMessage {
    /// Ask a peer for only its newest block.
    GetLatest,
    /// Ask a peer for its full chain.
    GetAll,
    /// A chain fragment: either just the newest block or the full chain.
    BlockchainResponse(Vec<Block>),
    /// Ask a peer for its full mempool.
    RequestMempool,
    /// The peer's pending transactions.
    MempoolResponse(Vec<Transaction>),
}

/// Payload sent by keep-alive timers: deliberately not a valid envelope, so
/// receivers drop it without dispatching.
pub const KEEPALIVE_PAYLOAD: &str = "\"\"";

impl PeerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("wire messages serialize to JSON")
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ledger::genesis_block;
    use ember_transactions::Transaction;
    use ember_types::{Address, Timestamp};

    fn sample_tx() -> Transaction {
        let address = Address::new(format!("04{}", "a".repeat(128)));
        Transaction::coinbase(address, 3, Timestamp::new(1000))
    }

    #[test]
    fn request_tags_match_protocol() {
        assert_eq!(PeerMessage::GetLatest.to_json(), r#"{"type":"GET_LATEST"}"#);
        assert_eq!(PeerMessage::GetAll.to_json(), r#"{"type":"GET_ALL"}"#);
        assert_eq!(
            PeerMessage::RequestMempool.to_json(),
            r#"{"type":"REQUEST_MEMPOOL"}"#
        );
    }

    #[test]
    fn requests_accept_explicit_null_data() {
        let msg = PeerMessage::parse(r#"{"type":"GET_LATEST","data":null}"#).unwrap();
        assert_eq!(msg, PeerMessage::GetLatest);
    }

    #[test]
    fn blockchain_response_round_trip() {
        let msg = PeerMessage::BlockchainResponse(vec![genesis_block()]);
        let json = msg.to_json();
        assert!(json.contains(r#""type":"BLOCKCHAIN_RESPONSE""#));
        assert!(json.contains(r#""data""#));
        let decoded = PeerMessage::parse(&json).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn mempool_response_round_trip() {
        let msg = PeerMessage::MempoolResponse(vec![sample_tx()]);
        let decoded = PeerMessage::parse(&msg.to_json()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(PeerMessage::parse(r#"{"type":"SHUTDOWN","data":null}"#).is_err());
    }

    #[test]
    fn keepalive_payload_is_not_an_envelope() {
        assert!(PeerMessage::parse(KEEPALIVE_PAYLOAD).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(PeerMessage::parse("").is_err());
        assert!(PeerMessage::parse("not json").is_err());
        assert!(PeerMessage::parse(r#"{"data":null}"#).is_err());
    }

    #[test]
    fn messages_are_newline_free() {
        let msg = PeerMessage::BlockchainResponse(vec![genesis_block()]);
        assert!(!msg.to_json().contains('\n'));
    }
}
