use std::{collections::HashSet, time::Duration};

use peerscan::{
    CapabilityProvider, DiscoveryEvent, EnableOutcome, EventSink, Grant, GrantOutcome,
    PeerIdentity, RadioError, RadioProvider, RadioStatus, Responder,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{task::AbortHandle, time::sleep};
use tracing::debug;

const NAMES: [&str; 6] = ["Pixel 8", "Galaxy Buds", "ThinkPad", "Watch", "Speaker", "Car Kit"];

/// Everything is granted and the radio is always on.
#[derive(Debug, Default)]
pub struct SimulatedCapabilities;
impl CapabilityProvider for SimulatedCapabilities {
    fn grants_held(&self) -> HashSet<Grant> {
        Grant::ALL.into_iter().collect()
    }
    fn radio_status(&self) -> RadioStatus {
        RadioStatus::Enabled
    }
    fn request_grants(&self, _grants: Vec<Grant>, responder: Responder<GrantOutcome>) {
        responder.respond(GrantOutcome::Granted);
    }
    fn request_radio_enable(&self, responder: Responder<EnableOutcome>) {
        responder.respond(EnableOutcome::Enabled);
    }
}

/// Advertises a fixed population of peers, each heard repeatedly at random
/// intervals.
#[derive(Debug)]
pub struct SimulatedRadio {
    peers: Vec<PeerIdentity>,
}
impl SimulatedRadio {
    pub fn new(count: usize) -> Self {
        let mut rng = rand::thread_rng();
        let peers = (0..count)
            .map(|_| {
                let octets: Vec<String> = (0..6)
                    .map(|_| format!("{:02X}", rng.gen::<u8>()))
                    .collect();
                let name = rng
                    .gen_bool(0.7)
                    .then(|| NAMES[rng.gen_range(0..NAMES.len())].to_owned());
                PeerIdentity::new(octets.join(":"), name)
            })
            .collect();
        Self { peers }
    }
}
impl RadioProvider for SimulatedRadio {
    type Handle = AbortHandle;

    fn start_scan(&self, events: EventSink) -> Result<AbortHandle, RadioError> {
        if self.peers.is_empty() {
            return Err(RadioError::Unsupported("no simulated peers".into()));
        }
        let peers = self.peers.clone();
        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                sleep(Duration::from_millis(rng.gen_range(5..400))).await;
                let peer = peers[rng.gen_range(0..peers.len())].clone();
                let event = DiscoveryEvent::new(peer).with_rssi(rng.gen_range(-95..-30));
                debug!("Advertising {}", event.peer);
                if events.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(task.abort_handle())
    }
    fn stop_scan(&self, handle: AbortHandle) {
        handle.abort();
    }
}
