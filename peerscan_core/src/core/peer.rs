use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// A peer seen over the radio. Identity is the radio address alone; the
/// display name rides along for presentation and never affects equality.
#[derive(Debug, Clone)]
pub struct PeerIdentity {
    address: String,
    name: Option<String>,
}
impl PeerIdentity {
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }
    pub fn named(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(address, Some(name.into()))
    }
    pub fn address(&self) -> &str {
        &self.address
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
impl PartialEq for PeerIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}
impl Eq for PeerIdentity {}
impl Hash for PeerIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}
impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// One raw sighting reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    pub peer: PeerIdentity,
    pub rssi: Option<i16>,
}
impl DiscoveryEvent {
    pub fn new(peer: PeerIdentity) -> Self {
        Self { peer, rssi: None }
    }
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }
}
impl From<PeerIdentity> for DiscoveryEvent {
    fn from(peer: PeerIdentity) -> Self {
        Self::new(peer)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_identity_ignores_name() {
        let named = PeerIdentity::named("AA:BB:CC:DD:EE:01", "Pixel");
        let renamed = PeerIdentity::named("AA:BB:CC:DD:EE:01", "Pixel 8");
        let anonymous = PeerIdentity::new("AA:BB:CC:DD:EE:01", None);
        assert_eq!(named, renamed);
        assert_eq!(named, anonymous);
        let set: HashSet<_> = [named, renamed, anonymous].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
    #[test]
    fn test_display() {
        assert_eq!(
            PeerIdentity::named("AA:BB", "Watch").to_string(),
            "Watch (AA:BB)"
        );
        assert_eq!(PeerIdentity::new("AA:BB", None).to_string(), "AA:BB");
    }
}
