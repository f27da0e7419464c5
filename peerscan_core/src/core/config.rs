use std::time::Duration;

use super::{Grant, PeerIdentity};

/// Whether peers that advertise no display name are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamePolicy {
    #[default]
    AcceptAll,
    RequireName,
}
impl NamePolicy {
    pub fn admits(self, peer: &PeerIdentity) -> bool {
        match self {
            NamePolicy::AcceptAll => true,
            NamePolicy::RequireName => peer.name().is_some_and(|n| !n.is_empty()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub scan_timeout: Duration,
    pub debounce: Duration,
    pub required_grants: Vec<Grant>,
    pub name_policy: NamePolicy,
}
impl Default for Config {
    fn default() -> Self {
        Config {
            scan_timeout: Duration::from_secs(5),
            debounce: Duration::from_millis(50),
            required_grants: vec![Grant::Scan, Grant::Connect],
            name_policy: NamePolicy::default(),
        }
    }
}
