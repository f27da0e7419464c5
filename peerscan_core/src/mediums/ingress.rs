use std::{fmt, sync::Arc, time::Duration};

use flume::Receiver;
use tokio::{
    select,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::RadioProvider;
use crate::{
    core::{DiscoveryEvent, RadioError},
    Context,
};

/// Turns the radio's bursty callback stream into a paced one.
///
/// Sightings are queued unbounded, so nothing is dropped. The consumer is
/// handed at most one sighting per `debounce`, in arrival order; a sighting
/// after a quiet spell goes through at once.
pub struct DiscoveryIngress<R: RadioProvider> {
    radio: Arc<R>,
    debounce: Duration,
}
impl<R: RadioProvider> DiscoveryIngress<R> {
    pub fn new(radio: Arc<R>, debounce: Duration) -> Self {
        Self { radio, debounce }
    }
    /// Starts a fresh radio scan. Fails synchronously, without ever calling
    /// `on_event`, when the radio cannot scan.
    pub fn start<F>(&self, context: &Context, on_event: F) -> Result<Subscription<R>, RadioError>
    where
        F: FnMut(DiscoveryEvent) + Send + 'static,
    {
        let (tx, rx) = flume::unbounded();
        let handle = self.radio.start_scan(tx)?;
        let cancel = context.child_token();
        context.spawn(pace(rx, self.debounce, cancel.clone(), on_event));
        info!("Radio scan started");
        Ok(Subscription {
            radio: self.radio.clone(),
            handle: Some(handle),
            cancel,
        })
    }
    pub fn stop(&self, subscription: Subscription<R>) {
        subscription.stop();
    }
}

async fn pace<F>(
    events: Receiver<DiscoveryEvent>,
    debounce: Duration,
    cancel: CancellationToken,
    mut on_event: F,
) where
    F: FnMut(DiscoveryEvent),
{
    let mut next_release = Instant::now();
    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep_until(next_release) => {}
        }
        let event = select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv_async() => match event {
                Ok(event) => event,
                Err(_) => break,
            },
        };
        trace!("Releasing {} ({} queued)", event.peer, events.len());
        on_event(event);
        next_release = Instant::now() + debounce;
    }
    debug!("Ingress closed");
}

/// A running radio scan. The scan is stopped exactly once, by `stop` or
/// on drop, whichever comes first.
pub struct Subscription<R: RadioProvider> {
    radio: Arc<R>,
    handle: Option<R::Handle>,
    cancel: CancellationToken,
}
impl<R: RadioProvider> Subscription<R> {
    pub fn stop(mut self) {
        self.release();
    }
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            self.radio.stop_scan(handle);
            info!("Radio scan stopped");
        }
    }
}
impl<R: RadioProvider> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.release();
    }
}
impl<R: RadioProvider> fmt::Debug for Subscription<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
