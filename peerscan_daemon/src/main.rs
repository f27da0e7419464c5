use std::{sync::Arc, time::Duration};

use clap::Parser;
use peerscan::{
    Config, NamePolicy, ScanPhase, SessionController,
    SessionEvent::{Failed, PeerDiscovered, PhaseChanged},
};
use tokio::{select, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(feature = "bluez"))]
mod sim;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How long one scan listens before settling.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 50)]
    debounce_ms: u64,
    /// Ignore peers that do not advertise a name.
    #[arg(long, default_value_t = false)]
    require_name: bool,
    /// Size of the simulated peer population.
    #[arg(long, default_value_t = 8)]
    peers: usize,
}
impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            scan_timeout: Duration::from_millis(args.timeout_ms),
            debounce: Duration::from_millis(args.debounce_ms),
            name_policy: if args.require_name {
                NamePolicy::RequireName
            } else {
                NamePolicy::AcceptAll
            },
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let config = Config::from(&args);
    #[cfg(feature = "bluez")]
    {
        let capabilities = Arc::new(peerscan::BluezCapabilities::new().await?);
        let radio = Arc::new(peerscan::BluezRadio::new(capabilities.adapter())?);
        run(SessionController::new(config, capabilities, radio)?).await;
    }
    #[cfg(not(feature = "bluez"))]
    {
        let capabilities = Arc::new(sim::SimulatedCapabilities);
        let radio = Arc::new(sim::SimulatedRadio::new(args.peers));
        run(SessionController::new(config, capabilities, radio)?).await;
    }
    Ok(())
}

async fn run<C, R>(controller: SessionController<C, R>)
where
    C: peerscan::CapabilityProvider,
    R: peerscan::RadioProvider,
{
    let events = controller.subscribe();
    controller.request_scan();
    loop {
        select! {
            event = events.recv_async() => match event {
                Ok(PeerDiscovered(peer)) => println!("{}", peer),
                Ok(Failed(e)) => warn!("{}", e),
                Ok(PhaseChanged(ScanPhase::Settled | ScanPhase::Idle)) | Err(_) => break,
                Ok(PhaseChanged(phase)) => info!("{:?}", phase),
            },
            _ = signal::ctrl_c() => {
                info!("Interrupted, stopping scan");
                controller.stop_scan();
            }
        }
    }
    let snapshot = controller.snapshot();
    println!("{} peers", snapshot.peers.len());
    for peer in &snapshot.peers {
        println!("  {}", peer);
    }
    if let Some(error) = &snapshot.error {
        println!("error: {}", error);
    }
    controller.shutdown().await;
}
