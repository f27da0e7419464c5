use std::sync::Arc;

use peerscan::{
    BluezCapabilities, BluezRadio, Config, ScanPhase, SessionController,
    SessionEvent::{Failed, PeerDiscovered, PhaseChanged},
};
use tokio::{select, signal::ctrl_c};
use tracing::{info, warn};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    tracing_subscriber::fmt().pretty().init();
    let capabilities = Arc::new(BluezCapabilities::new().await.unwrap());
    let radio = Arc::new(BluezRadio::new(capabilities.adapter()).unwrap());
    let controller = SessionController::new(Config::default(), capabilities, radio).unwrap();
    let events = controller.subscribe();
    controller.request_scan();
    info!("Started discovery");
    loop {
        select! {
            event = events.recv_async() => match event {
                Ok(PeerDiscovered(peer)) => info!("{}", peer),
                Ok(Failed(e)) => warn!("{}", e),
                Ok(PhaseChanged(ScanPhase::Settled | ScanPhase::Idle)) | Err(_) => break,
                Ok(PhaseChanged(_)) => {}
            },
            _ = ctrl_c() => controller.stop_scan(),
        }
    }
    info!("{:?}", controller.snapshot());
    controller.shutdown().await;
}
