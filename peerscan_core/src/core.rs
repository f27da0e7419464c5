mod capability;
mod config;
mod errors;
mod peer;
mod registry;
pub(crate) use capability::missing_grants;
pub use capability::{CapabilityState, Grant, RadioStatus};
pub use config::{Config, NamePolicy};
pub use errors::{PeerscanError, PeerscanResult, RadioError, SessionError};
pub use peer::{DiscoveryEvent, PeerIdentity};
pub use registry::DeviceRegistry;
