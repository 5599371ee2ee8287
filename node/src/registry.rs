//! Peer connection registry.
//!
//! Owns the outbound side of every live peer connection: an unbounded
//! message channel drained by the connection's writer task (so sends to one
//! peer stay in order), plus the peer's keep-alive task handle. The
//! registry is the only place peers are added or removed; removal is
//! idempotent and cancels the keep-alive task so no timer outlives its
//! connection.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one live peer connection. Ids are never reused within a
/// process; a reconnecting peer gets a fresh id.
pub type PeerId = u64;

struct PeerHandle {
    outbox: mpsc::UnboundedSender<String>,
    keepalive: Option<JoinHandle<()>>,
}

/// Registry of live peer connections.
pub struct PeerRegistry {
    next_id: PeerId,
    peers: HashMap<PeerId, PeerHandle>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            peers: HashMap::new(),
        }
    }

    /// Register a new connection. Returns the peer id and the receiver the
    /// connection's writer task drains.
    pub fn add(&mut self) -> (PeerId, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id;
        self.next_id += 1;
        let (outbox, rx) = mpsc::unbounded_channel();
        self.peers.insert(
            id,
            PeerHandle {
                outbox,
                keepalive: None,
            },
        );
        (id, rx)
    }

    /// Attach the peer's keep-alive task so teardown can cancel it. If the
    /// peer was already removed, the task is cancelled immediately.
    pub fn set_keepalive(&mut self, id: PeerId, handle: JoinHandle<()>) {
        match self.peers.get_mut(&id) {
            Some(peer) => {
                if let Some(old) = peer.keepalive.replace(handle) {
                    old.abort();
                }
            }
            None => handle.abort(),
        }
    }

    /// Queue a message to one peer. Returns `false` if the peer is gone.
    pub fn send_to(&self, id: PeerId, text: String) -> bool {
        match self.peers.get(&id) {
            Some(peer) => peer.outbox.send(text).is_ok(),
            None => false,
        }
    }

    /// Queue a message to every registered peer.
    pub fn broadcast(&self, text: &str) {
        for peer in self.peers.values() {
            let _ = peer.outbox.send(text.to_string());
        }
    }

    /// Remove a peer and cancel its keep-alive task. Safe to call for a
    /// peer that was already removed; returns whether anything was removed.
    pub fn remove(&mut self, id: PeerId) -> bool {
        match self.peers.remove(&id) {
            Some(peer) => {
                if let Some(keepalive) = peer.keepalive {
                    keepalive.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_send() {
        let mut registry = PeerRegistry::new();
        let (id, mut rx) = registry.add();
        assert!(registry.send_to(id, "hello".into()));
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn broadcast_reaches_every_peer() {
        let mut registry = PeerRegistry::new();
        let (_a, mut rx_a) = registry.add();
        let (_b, mut rx_b) = registry.add();
        registry.broadcast("ping");
        assert_eq!(rx_a.recv().await.unwrap(), "ping");
        assert_eq!(rx_b.recv().await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let mut registry = PeerRegistry::new();
        let (id, _rx) = registry.add();
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn send_to_removed_peer_fails() {
        let mut registry = PeerRegistry::new();
        let (id, _rx) = registry.add();
        registry.remove(id);
        assert!(!registry.send_to(id, "late".into()));
    }

    #[tokio::test]
    async fn remove_cancels_keepalive() {
        let mut registry = PeerRegistry::new();
        let (id, _rx) = registry.add();
        let task = tokio::spawn(async {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            }
        });
        registry.set_keepalive(id, task);
        registry.remove(id);
        // The aborted task finishes promptly instead of sleeping forever.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn keepalive_for_vanished_peer_cancelled_immediately() {
        let mut registry = PeerRegistry::new();
        let (id, _rx) = registry.add();
        registry.remove(id);
        let task = tokio::spawn(async {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            }
        });
        registry.set_keepalive(id, task);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let mut registry = PeerRegistry::new();
        let (a, _rx_a) = registry.add();
        registry.remove(a);
        let (b, _rx_b) = registry.add();
        assert_ne!(a, b);
    }
}
