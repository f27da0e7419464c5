use tokio::time::Instant;

use crate::{PeerIdentity, ScanPhase, SessionError};

/// Immutable view of a session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: ScanPhase,
    pub peers: Vec<PeerIdentity>,
    pub error: Option<SessionError>,
    /// When the running scan times out; `None` outside `Scanning`.
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(ScanPhase),
    PeerDiscovered(PeerIdentity),
    Failed(SessionError),
}
