#[cfg(feature = "bluez")]
pub mod bt;
mod gate;
mod generic;
mod ingress;
pub use gate::{CapabilityGate, Readiness};
pub use generic::{
    CapabilityProvider, EnableOutcome, EventSink, GrantOutcome, RadioProvider, Responder,
};
pub use ingress::{DiscoveryIngress, Subscription};
