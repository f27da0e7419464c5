mod api;
mod core;
mod mediums;
pub(crate) mod runner;
pub use crate::core::{
    CapabilityState, Config, DeviceRegistry, DiscoveryEvent, Grant, NamePolicy, PeerIdentity,
    PeerscanError, PeerscanResult, RadioError, RadioStatus, SessionError,
};
pub use api::events::{SessionEvent, SessionSnapshot};
#[cfg(feature = "bluez")]
pub use mediums::bt::{BluezCapabilities, BluezRadio};
pub use mediums::{
    CapabilityGate, CapabilityProvider, DiscoveryIngress, EnableOutcome, EventSink, GrantOutcome,
    RadioProvider, Readiness, Responder, Subscription,
};
pub use runner::context::Context;
pub use runner::controller::SessionController;
pub use runner::session::{ScanPhase, ScanSession, SettleReason};
