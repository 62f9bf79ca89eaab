pub mod config;
pub mod environment;
pub mod errors;
pub mod manager;
pub mod metrics_defs;
pub mod poller;
pub mod throttle;
pub mod types;

mod assembler;
mod fetcher;

#[cfg(test)]
mod testutils;

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

pub use manager::{RolloutManager, SnapshotCallback};
pub use types::RolloutSnapshot;

/// Run the rollout manager in standalone mode: delivered snapshots are
/// logged and parked in a process-wide slot, and the probe loop drives
/// change detection until the process exits.
pub async fn run(config: config::ManagerConfig) -> Result<(), errors::CycleError> {
    let env = environment::TokioEnvironment::new();

    let latest_snapshot: Arc<RwLock<Option<RolloutSnapshot>>> = Arc::new(RwLock::new(None));
    let slot = latest_snapshot.clone();
    let callback: SnapshotCallback = Box::new(move |snapshot: RolloutSnapshot| {
        tracing::info!(
            rollout_id = %snapshot.rollout_id,
            configs = snapshot.configs.len(),
            "applied rollout snapshot"
        );
        *slot.write() = Some(snapshot);
    });

    let poll_interval = Duration::from_secs(config.poll_interval_s);
    let manager = RolloutManager::new(config, env, callback);

    poller::run(&manager, poll_interval).await;
    Ok(())
}
