use std::{collections::HashSet, fmt};

use flume::Sender;

use crate::core::{DiscoveryEvent, Grant, RadioError, RadioStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    Denied,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    Enabled,
    Declined,
}

/// One-shot reply channel handed to a capability provider.
///
/// `respond` consumes it. Dropping it unanswered delivers `None`, so the
/// waiting side always hears back exactly once.
pub struct Responder<T: Send + 'static> {
    deliver: Option<Box<dyn FnOnce(Option<T>) + Send>>,
}
impl<T: Send + 'static> Responder<T> {
    pub fn new(deliver: impl FnOnce(Option<T>) + Send + 'static) -> Self {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }
    pub fn respond(mut self, value: T) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Some(value));
        }
    }
}
impl<T: Send + 'static> Drop for Responder<T> {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            deliver(None);
        }
    }
}
impl<T: Send + 'static> fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("pending", &self.deliver.is_some())
            .finish()
    }
}

/// Platform permission and radio-power dialogs.
///
/// `grants_held` and `radio_status` must not block. The request methods may
/// answer inline or later from any thread.
pub trait CapabilityProvider: Send + Sync + 'static {
    fn grants_held(&self) -> HashSet<Grant>;
    fn radio_status(&self) -> RadioStatus;
    fn request_grants(&self, grants: Vec<Grant>, responder: Responder<GrantOutcome>);
    fn request_radio_enable(&self, responder: Responder<EnableOutcome>);
}

pub type EventSink = Sender<DiscoveryEvent>;

/// The physical scanner. Sightings are pushed into the sink until
/// `stop_scan` is called with the handle `start_scan` returned.
///
/// `stop_scan` may be called while the session lock is held and must not
/// call back into the controller.
pub trait RadioProvider: Send + Sync + 'static {
    type Handle: Send + 'static;
    fn start_scan(&self, events: EventSink) -> Result<Self::Handle, RadioError>;
    fn stop_scan(&self, handle: Self::Handle);
}
