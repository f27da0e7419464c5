use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use bluer::{Adapter, AdapterEvent, AdapterProperty, Session};
use futures::{pin_mut, StreamExt};
use tokio::{runtime::Handle, select};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    core::{Grant, PeerscanResult, RadioStatus},
    mediums::{CapabilityProvider, EnableOutcome, GrantOutcome, Responder},
};

/// Capabilities of the local BlueZ daemon. Access is governed by D-Bus
/// policy rather than runtime prompts, so every grant counts as held.
pub struct BluezCapabilities {
    _session: Session,
    adapter: Option<Adapter>,
    powered: Arc<AtomicBool>,
    runtime: Handle,
    cancel: CancellationToken,
}
impl BluezCapabilities {
    pub async fn new() -> PeerscanResult<Self> {
        let session = Session::new().await?;
        let adapter = match session.default_adapter().await {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!("No default Bluetooth adapter: {}", e);
                None
            }
        };
        let powered = match &adapter {
            Some(adapter) => adapter.is_powered().await?,
            None => false,
        };
        let capabilities = Self {
            _session: session,
            adapter,
            powered: Arc::new(AtomicBool::new(powered)),
            runtime: Handle::try_current()?,
            cancel: CancellationToken::new(),
        };
        capabilities.watch_power().await?;
        Ok(capabilities)
    }
    /// The adapter scans should run on, if the host has one.
    pub fn adapter(&self) -> Option<Adapter> {
        self.adapter.clone()
    }
    async fn watch_power(&self) -> PeerscanResult<()> {
        let Some(adapter) = &self.adapter else {
            return Ok(());
        };
        let events = adapter.events().await?;
        let powered = self.powered.clone();
        let cancel = self.cancel.clone();
        let name = adapter.name().to_owned();
        self.runtime.spawn(async move {
            pin_mut!(events);
            loop {
                select! {
                    _ = cancel.cancelled() => break,
                    event = events.next() => match event {
                        Some(AdapterEvent::PropertyChanged(AdapterProperty::Powered(on))) => {
                            info!("Adapter {} powered {}", name, on);
                            powered.store(on, Ordering::SeqCst);
                        }
                        Some(_) => {}
                        None => break,
                    },
                }
            }
            debug!("Stopped watching adapter {}", name);
        });
        Ok(())
    }
}
impl CapabilityProvider for BluezCapabilities {
    fn grants_held(&self) -> HashSet<Grant> {
        Grant::ALL.into_iter().collect()
    }
    fn radio_status(&self) -> RadioStatus {
        match &self.adapter {
            None => RadioStatus::Unsupported,
            Some(_) if self.powered.load(Ordering::SeqCst) => RadioStatus::Enabled,
            Some(_) => RadioStatus::Disabled,
        }
    }
    fn request_grants(&self, _grants: Vec<Grant>, responder: Responder<GrantOutcome>) {
        responder.respond(GrantOutcome::Granted);
    }
    fn request_radio_enable(&self, responder: Responder<EnableOutcome>) {
        let Some(adapter) = self.adapter.clone() else {
            responder.respond(EnableOutcome::Declined);
            return;
        };
        let powered = self.powered.clone();
        self.runtime.spawn(async move {
            match adapter.set_powered(true).await {
                Ok(()) => {
                    powered.store(true, Ordering::SeqCst);
                    responder.respond(EnableOutcome::Enabled);
                }
                Err(e) => {
                    warn!("Could not power on {}: {}", adapter.name(), e);
                    responder.respond(EnableOutcome::Declined);
                }
            }
        });
    }
}
impl Drop for BluezCapabilities {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
