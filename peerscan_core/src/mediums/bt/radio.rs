use bluer::{Adapter, AdapterEvent, Address};
use futures::{pin_mut, StreamExt};
use tokio::{runtime::Handle, select};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::{
    core::{DiscoveryEvent, PeerIdentity, PeerscanResult, RadioError},
    mediums::{EventSink, RadioProvider},
};

/// Runs BlueZ device discovery on one adapter. Stopping a scan drops the
/// discovery stream, which ends discovery on the daemon side.
pub struct BluezRadio {
    adapter: Option<Adapter>,
    runtime: Handle,
}
impl BluezRadio {
    pub fn new(adapter: Option<Adapter>) -> PeerscanResult<Self> {
        Ok(Self {
            adapter,
            runtime: Handle::try_current()?,
        })
    }
}
impl RadioProvider for BluezRadio {
    type Handle = CancellationToken;

    fn start_scan(&self, events: EventSink) -> Result<CancellationToken, RadioError> {
        let adapter = self
            .adapter
            .clone()
            .ok_or_else(|| RadioError::Unsupported("no Bluetooth adapter".into()))?;
        let cancel = CancellationToken::new();
        let stopped = cancel.clone();
        self.runtime.spawn(async move {
            info!("Discovering on {}", adapter.name());
            select! {
                _ = stopped.cancelled() => {}
                result = discover(&adapter, &events) => {
                    if let Err(e) = result {
                        warn!("Discovery on {} ended: {}", adapter.name(), e);
                    }
                }
            }
        });
        Ok(cancel)
    }
    fn stop_scan(&self, handle: CancellationToken) {
        handle.cancel();
    }
}

async fn discover(adapter: &Adapter, events: &EventSink) -> PeerscanResult<()> {
    let discovery = adapter.discover_devices().await?;
    pin_mut!(discovery);
    while let Some(event) = discovery.next().await {
        trace!("{:?}", event);
        if let AdapterEvent::DeviceAdded(addr) = event {
            if events.send(sighting(adapter, addr).await?).is_err() {
                break;
            }
        }
    }
    Ok(())
}
async fn sighting(adapter: &Adapter, addr: Address) -> PeerscanResult<DiscoveryEvent> {
    let device = adapter.device(addr)?;
    let event = DiscoveryEvent::new(PeerIdentity::new(addr.to_string(), device.name().await?));
    Ok(match device.rssi().await? {
        Some(rssi) => event.with_rssi(rssi),
        None => event,
    })
}
