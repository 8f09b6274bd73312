//! Peer presence tracking.
//!
//! The time-bounded set of peers currently considered reachable on the
//! session's joined topics. Heartbeats populate it, silence empties it:
//! an entry with no heartbeat for the liveness timeout is removed by the
//! periodic sweep. Expired peers are deleted, not archived.

use std::collections::HashMap;

use tracing::debug;

use geomesh_shared::protocol::PeerAnnounce;
use geomesh_shared::types::PeerId;

/// A peer observed via heartbeat on a joined topic. Ephemeral; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    pub public_key: String,
    pub h3_index: String,
    /// Last heartbeat, Unix epoch milliseconds.
    pub last_seen: i64,
}

/// Live peer set for one session.
#[derive(Debug, Default)]
pub struct PresenceTable {
    peers: HashMap<PeerId, Peer>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by peer id. Every field is replaced, not just `last_seen`,
    /// so a peer that moved cells or renamed itself is tracked at its
    /// latest announcement.
    pub fn record_heartbeat(&mut self, announce: &PeerAnnounce, now_ms: i64) -> Peer {
        let peer = Peer {
            id: announce.id.clone(),
            name: announce.name.clone(),
            public_key: announce.public_key.clone(),
            h3_index: announce.h3_index.clone(),
            last_seen: now_ms,
        };
        self.peers.insert(peer.id.clone(), peer.clone());
        peer
    }

    /// Remove peers silent for `timeout_ms` or longer. Returns how many
    /// were removed.
    pub fn sweep_expired(&mut self, now_ms: i64, timeout_ms: i64) -> usize {
        let before = self.peers.len();
        self.peers
            .retain(|_, peer| now_ms - peer.last_seen < timeout_ms);
        let removed = before - self.peers.len();
        if removed > 0 {
            debug!(removed, remaining = self.peers.len(), "expired silent peers");
        }
        removed
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    pub fn get(&self, id: &PeerId) -> Option<&Peer> {
        self.peers.get(id)
    }

    /// Snapshot of all live peers.
    pub fn active_peers(&self) -> Vec<Peer> {
        self.peers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomesh_shared::constants::PEER_TIMEOUT_MS;

    fn announce(id: &str, cell: &str) -> PeerAnnounce {
        PeerAnnounce {
            id: PeerId(id.into()),
            name: format!("{id}_name"),
            public_key: format!("{id}_key"),
            h3_index: cell.into(),
        }
    }

    #[test]
    fn test_heartbeat_then_expiry_window() {
        let mut table = PresenceTable::new();
        let t0 = 1_000_000;
        table.record_heartbeat(&announce("A1", "cell-a"), t0);

        // Present 29s later, gone at 31s (and at exactly 30s).
        table.sweep_expired(t0 + 29_000, PEER_TIMEOUT_MS);
        assert!(table.contains(&PeerId("A1".into())));

        table.sweep_expired(t0 + 31_000, PEER_TIMEOUT_MS);
        assert!(!table.contains(&PeerId("A1".into())));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let mut table = PresenceTable::new();
        table.record_heartbeat(&announce("A1", "cell-a"), 0);
        let removed = table.sweep_expired(PEER_TIMEOUT_MS, PEER_TIMEOUT_MS);
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_refresh_extends_liveness() {
        let mut table = PresenceTable::new();
        table.record_heartbeat(&announce("A1", "cell-a"), 0);
        table.record_heartbeat(&announce("A1", "cell-a"), 20_000);

        table.sweep_expired(35_000, PEER_TIMEOUT_MS);
        assert!(table.contains(&PeerId("A1".into())));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_every_field() {
        let mut table = PresenceTable::new();
        table.record_heartbeat(&announce("A1", "cell-a"), 0);

        let mut moved = announce("A1", "cell-b");
        moved.name = "renamed".into();
        table.record_heartbeat(&moved, 10);

        let peer = table.get(&PeerId("A1".into())).unwrap();
        assert_eq!(peer.h3_index, "cell-b");
        assert_eq!(peer.name, "renamed");
        assert_eq!(peer.last_seen, 10);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sweep_only_removes_silent_peers() {
        let mut table = PresenceTable::new();
        table.record_heartbeat(&announce("A1", "cell-a"), 0);
        table.record_heartbeat(&announce("B2", "cell-b"), 25_000);

        let removed = table.sweep_expired(40_000, PEER_TIMEOUT_MS);
        assert_eq!(removed, 1);
        assert!(!table.contains(&PeerId("A1".into())));
        assert!(table.contains(&PeerId("B2".into())));
    }

    #[test]
    fn test_clear() {
        let mut table = PresenceTable::new();
        table.record_heartbeat(&announce("A1", "cell-a"), 0);
        assert!(!table.is_empty());
        table.clear();
        assert!(table.is_empty());
    }
}
