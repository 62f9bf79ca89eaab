use crate::environment::Environment;
use crate::manager::RolloutManager;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// The daemon's advertisement source: periodically asks the control plane
/// which rollout it serves and feeds the ID into the manager. This is an ID
/// probe only; the full weighted fetch stays debounced behind the manager's
/// randomized throttle window.
pub async fn run<E: Environment>(manager: &RolloutManager<E>, poll_interval: Duration) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match manager.check_advertised_rollout().await {
            Ok(rollout_id) => {
                tracing::debug!(rollout_id = %rollout_id, "rollout id probe completed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "rollout id probe failed");
            }
        }
    }
}
