use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use flume::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use super::session::{ScanPhase, ScanSession, SettleReason};
use crate::{
    api::events::{SessionEvent, SessionSnapshot},
    core::{Config, DiscoveryEvent, PeerIdentity, PeerscanResult, SessionError},
    mediums::{CapabilityGate, CapabilityProvider, DiscoveryIngress, RadioProvider, Readiness},
    Context,
};

struct State<R: RadioProvider> {
    session: ScanSession<R>,
    error: Option<SessionError>,
    listeners: Vec<Sender<SessionEvent>>,
}
impl<R: RadioProvider> State<R> {
    fn emit(&mut self, event: SessionEvent) {
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }
    fn surface(&mut self, err: SessionError) {
        match &err {
            SessionError::Internal(_) => error!("{}", err),
            _ => warn!("{}", err),
        }
        self.error = Some(err.clone());
        self.emit(SessionEvent::Failed(err));
    }
}

struct Inner<C: CapabilityProvider, R: RadioProvider> {
    context: Context,
    gate: CapabilityGate<C>,
    ingress: DiscoveryIngress<R>,
    state: Mutex<State<R>>,
}
impl<C: CapabilityProvider, R: RadioProvider> Inner<C, R> {
    // Session transitions finish their own writes before calling out to a
    // provider, and a provider panic is caught in `advance`, so the state
    // behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    /// The one place failures of an attempt are caught and surfaced,
    /// including a provider that panics while the attempt is pending.
    fn advance(self: &Arc<Self>, attempt: u64, enable_requested: bool) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.try_advance(attempt, enable_requested)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.abort(attempt, e.into()),
            Err(panic) => self.abort(
                attempt,
                SessionError::Internal(format!("provider panicked: {}", panic_message(&*panic))),
            ),
        }
    }
    fn try_advance(self: &Arc<Self>, attempt: u64, enable_requested: bool) -> PeerscanResult<()> {
        if !self.lock().session.is_awaiting(attempt) {
            debug!("Attempt {} is no longer pending", attempt);
            return Ok(());
        }
        let capabilities = self.gate.evaluate();
        match self.gate.assess(&capabilities) {
            Readiness::Ready => self.start_scanning(attempt)?,
            Readiness::NeedsGrants(missing) => {
                let weak = Arc::downgrade(self);
                self.gate.request_grants(missing, move |result| {
                    if let Some(inner) = weak.upgrade() {
                        inner.resolve(attempt, result, enable_requested);
                    }
                });
            }
            Readiness::NeedsRadio if enable_requested => {
                self.abort(attempt, SessionError::RadioDisabled)
            }
            Readiness::NeedsRadio => {
                {
                    let mut state = self.lock();
                    if !state.session.is_awaiting(attempt) {
                        return Ok(());
                    }
                    state.surface(SessionError::RadioDisabled);
                }
                let weak = Arc::downgrade(self);
                self.gate.request_radio_enable(move |result| {
                    if let Some(inner) = weak.upgrade() {
                        inner.resolve(attempt, result, true);
                    }
                });
            }
            Readiness::Refused(err) => self.abort(attempt, err),
        }
        Ok(())
    }
    fn resolve(self: &Arc<Self>, attempt: u64, result: Result<(), SessionError>, enable_requested: bool) {
        match result {
            Ok(()) => self.advance(attempt, enable_requested),
            Err(err) => self.abort(attempt, err),
        }
    }
    fn start_scanning(self: &Arc<Self>, attempt: u64) -> PeerscanResult<()> {
        let on_event = {
            let weak = Arc::downgrade(self);
            move |attempt, event| {
                if let Some(inner) = weak.upgrade() {
                    inner.ingest(attempt, event);
                }
            }
        };
        let on_timeout = {
            let weak = Arc::downgrade(self);
            move |attempt| {
                if let Some(inner) = weak.upgrade() {
                    inner.settle(Some(attempt), SettleReason::TimedOut);
                }
            }
        };
        let mut state = self.lock();
        let started = state.session.begin_scanning(
            attempt,
            &self.ingress,
            &self.context,
            on_event,
            on_timeout,
        )?;
        if started {
            // Enabling the radio resolved the banner shown while waiting.
            if state.error == Some(SessionError::RadioDisabled) {
                state.error = None;
            }
            state.emit(SessionEvent::PhaseChanged(ScanPhase::Scanning));
        }
        Ok(())
    }
    fn ingest(&self, attempt: u64, event: DiscoveryEvent) {
        let mut state = self.lock();
        if let Some(peer) = state.session.ingest(attempt, event) {
            state.emit(SessionEvent::PeerDiscovered(peer));
        }
    }
    fn settle(&self, attempt: Option<u64>, reason: SettleReason) {
        let mut state = self.lock();
        if state.session.settle(attempt, reason) {
            state.emit(SessionEvent::PhaseChanged(ScanPhase::Settled));
        } else {
            debug!("No scan to settle ({:?})", reason);
        }
    }
    fn abort(&self, attempt: u64, err: SessionError) {
        let mut state = self.lock();
        if state.session.abandon(attempt) {
            state.surface(err);
            state.emit(SessionEvent::PhaseChanged(ScanPhase::Idle));
        } else {
            debug!("Dropping {:?} for finished attempt {}", err, attempt);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown cause"
    }
}

/// Entry point for a discovery screen: permission checks, one scan session
/// and the error banner. Dropping it stops any running scan.
pub struct SessionController<C: CapabilityProvider, R: RadioProvider> {
    inner: Arc<Inner<C, R>>,
}
impl<C: CapabilityProvider, R: RadioProvider> SessionController<C, R> {
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: Config,
        capabilities: Arc<C>,
        radio: Arc<R>,
    ) -> PeerscanResult<Self> {
        let context = Context::new(config)?;
        let config = &context.config;
        let inner = Inner {
            gate: CapabilityGate::new(capabilities, config.required_grants.clone()),
            ingress: DiscoveryIngress::new(radio, config.debounce),
            state: Mutex::new(State {
                session: ScanSession::new(config),
                error: None,
                listeners: Vec::new(),
            }),
            context,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
    /// Starts a new scan unless one is already pending or running. Always
    /// clears a stale error.
    #[tracing::instrument(skip_all)]
    pub fn request_scan(&self) {
        let attempt = {
            let mut state = self.inner.lock();
            state.error = None;
            match state.session.request() {
                Some(attempt) => {
                    state.emit(SessionEvent::PhaseChanged(ScanPhase::AwaitingCapability));
                    attempt
                }
                None => {
                    debug!("Scan already {:?}, ignoring request", state.session.phase());
                    return;
                }
            }
        };
        info!("Requesting scan {}", attempt);
        self.inner.advance(attempt, false);
    }
    #[tracing::instrument(skip_all)]
    pub fn stop_scan(&self) {
        self.inner.settle(None, SettleReason::Stopped);
    }
    pub fn phase(&self) -> ScanPhase {
        self.inner.lock().session.phase()
    }
    pub fn error(&self) -> Option<SessionError> {
        self.inner.lock().error.clone()
    }
    pub fn clear_error(&self) {
        self.inner.lock().error = None;
    }
    pub fn results(&self) -> Vec<PeerIdentity> {
        self.inner.lock().session.peers()
    }
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock();
        SessionSnapshot {
            phase: state.session.phase(),
            peers: state.session.peers(),
            error: state.error.clone(),
            deadline: state.session.deadline(),
        }
    }
    pub fn config(&self) -> &Config {
        &self.inner.context.config
    }
    /// Pushes every transition, new peer and error from now on.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = flume::unbounded();
        self.inner.lock().listeners.push(tx);
        rx
    }
    /// Tears the session down and waits for its background tasks to exit.
    pub async fn shutdown(self) {
        let context = self.inner.context.clone();
        drop(self);
        context.shutdown().await;
    }
}
impl<C: CapabilityProvider, R: RadioProvider> Drop for SessionController<C, R> {
    fn drop(&mut self) {
        self.inner.lock().session.teardown();
        self.inner.context.cancel();
    }
}
impl<C: CapabilityProvider, R: RadioProvider> fmt::Debug for SessionController<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.inner.lock().session)
            .finish()
    }
}
