use std::{fmt, time::Duration};

use tokio::{
    select,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    core::{Config, DeviceRegistry, DiscoveryEvent, NamePolicy, PeerIdentity, RadioError},
    mediums::{DiscoveryIngress, RadioProvider, Subscription},
    Context,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScanPhase {
    #[default]
    Idle,
    AwaitingCapability,
    Scanning,
    Settled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleReason {
    TimedOut,
    Stopped,
}

struct ActiveScan<R: RadioProvider> {
    subscription: Subscription<R>,
    timer: CancellationToken,
    deadline: Instant,
}
impl<R: RadioProvider> ActiveScan<R> {
    fn shut(self) {
        self.timer.cancel();
        self.subscription.stop();
    }
}

/// Phase, results and live resources of one discovery screen.
///
/// Every request that leaves `Idle` or `Settled` opens a new attempt. Timer
/// and ingress callbacks carry the attempt they were armed for, and any
/// that arrive for an older attempt are ignored.
pub struct ScanSession<R: RadioProvider> {
    phase: ScanPhase,
    attempt: u64,
    registry: DeviceRegistry,
    active: Option<ActiveScan<R>>,
    timeout: Duration,
    name_policy: NamePolicy,
}
impl<R: RadioProvider> ScanSession<R> {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: ScanPhase::Idle,
            attempt: 0,
            registry: DeviceRegistry::new(),
            active: None,
            timeout: config.scan_timeout,
            name_policy: config.name_policy,
        }
    }
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }
    pub fn peers(&self) -> Vec<PeerIdentity> {
        self.registry.snapshot()
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.active.as_ref().map(|active| active.deadline)
    }
    pub fn is_awaiting(&self, attempt: u64) -> bool {
        self.phase == ScanPhase::AwaitingCapability && self.attempt == attempt
    }
    /// Opens a new attempt, wiping the previous results. `None` while an
    /// attempt is already underway.
    pub fn request(&mut self) -> Option<u64> {
        match self.phase {
            ScanPhase::Idle | ScanPhase::Settled => {
                self.registry.clear();
                self.attempt += 1;
                self.phase = ScanPhase::AwaitingCapability;
                Some(self.attempt)
            }
            ScanPhase::AwaitingCapability | ScanPhase::Scanning => None,
        }
    }
    /// Capability checks failed; back to `Idle`.
    pub fn abandon(&mut self, attempt: u64) -> bool {
        if !self.is_awaiting(attempt) {
            return false;
        }
        self.phase = ScanPhase::Idle;
        true
    }
    /// Starts ingress and arms the timeout. `Ok(false)` when `attempt` is no
    /// longer the one waiting on capabilities.
    pub fn begin_scanning<E, T>(
        &mut self,
        attempt: u64,
        ingress: &DiscoveryIngress<R>,
        context: &Context,
        mut on_event: E,
        on_timeout: T,
    ) -> Result<bool, RadioError>
    where
        E: FnMut(u64, DiscoveryEvent) + Send + 'static,
        T: FnOnce(u64) + Send + 'static,
    {
        if !self.is_awaiting(attempt) {
            return Ok(false);
        }
        debug_assert!(self.registry.is_empty());
        let subscription = ingress.start(context, move |event| on_event(attempt, event))?;
        let timer = context.child_token();
        let deadline = Instant::now() + self.timeout;
        let armed = timer.clone();
        context.spawn(async move {
            select! {
                biased;
                _ = armed.cancelled() => {}
                _ = sleep_until(deadline) => on_timeout(attempt),
            }
        });
        self.active = Some(ActiveScan {
            subscription,
            timer,
            deadline,
        });
        self.phase = ScanPhase::Scanning;
        info!("Scan {} running for {:?}", attempt, self.timeout);
        Ok(true)
    }
    /// Routes a sighting into the registry. Returns the peer when it is new.
    pub fn ingest(&mut self, attempt: u64, event: DiscoveryEvent) -> Option<PeerIdentity> {
        if self.phase != ScanPhase::Scanning || self.attempt != attempt {
            return None;
        }
        if !self.name_policy.admits(&event.peer) {
            debug!("Skipping unnamed peer {}", event.peer);
            return None;
        }
        let peer = event.peer;
        if self.registry.add(peer.clone()) {
            debug!("Discovered {} (rssi {:?})", peer, event.rssi);
            Some(peer)
        } else {
            None
        }
    }
    /// Leaves `Scanning`. The first caller wins; later calls, or calls for an
    /// older attempt, change nothing.
    pub fn settle(&mut self, attempt: Option<u64>, reason: SettleReason) -> bool {
        if self.phase != ScanPhase::Scanning {
            return false;
        }
        if attempt.is_some_and(|attempt| attempt != self.attempt) {
            return false;
        }
        let active = self.active.take();
        self.phase = ScanPhase::Settled;
        if let Some(active) = active {
            active.shut();
        }
        info!(
            "Scan {} settled ({:?}) with {} peers",
            self.attempt,
            reason,
            self.registry.len()
        );
        true
    }
    /// Releases the timer and the radio and returns to `Idle`. This is
    /// destruction rather than a new session; the results go with it so that
    /// `Idle` never shows peers.
    pub fn teardown(&mut self) {
        let active = self.active.take();
        self.registry.clear();
        self.phase = ScanPhase::Idle;
        if let Some(active) = active {
            active.shut();
        }
    }
}
impl<R: RadioProvider> Drop for ScanSession<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
impl<R: RadioProvider> fmt::Debug for ScanSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("phase", &self.phase)
            .field("attempt", &self.attempt)
            .field("peers", &self.registry.len())
            .finish()
    }
}
