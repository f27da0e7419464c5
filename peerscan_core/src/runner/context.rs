use std::future::Future;

use tokio::runtime::Handle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{Config, PeerscanResult};

/// Runtime, configuration and cancellation root shared by one controller
/// and every task it spawns.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    runtime: Handle,
    cancel: CancellationToken,
    tasks: TaskTracker,
}
impl Context {
    /// Captures the current tokio runtime; fails outside of one.
    pub fn new(config: Config) -> PeerscanResult<Self> {
        Ok(Self {
            config,
            runtime: Handle::try_current()?,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }
    pub fn spawn<F: Future<Output = ()> + Send + 'static>(&self, task: F) {
        self.tasks.spawn_on(task, &self.runtime);
    }
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}
