use std::collections::HashSet;

use super::PeerIdentity;

/// Insertion-ordered set of peers seen during one session.
///
/// Not synchronized: the owning [`ScanSession`](crate::ScanSession) is the
/// only writer.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    peers: Vec<PeerIdentity>,
    seen: HashSet<String>,
}
impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns true when `peer` was not present yet.
    pub fn add(&mut self, peer: PeerIdentity) -> bool {
        if !self.seen.insert(peer.address().to_owned()) {
            return false;
        }
        self.peers.push(peer);
        true
    }
    pub fn clear(&mut self) {
        self.peers.clear();
        self.seen.clear();
    }
    pub fn snapshot(&self) -> Vec<PeerIdentity> {
        self.peers.clone()
    }
    pub fn len(&self) -> usize {
        self.peers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
