//! The rollout state machine: tracks the current vs. latest advertised
//! rollout ID, debounces change notifications into randomized-delay fetch
//! cycles, and delivers fully assembled snapshots to the consumer callback.

use crate::assembler::assemble_configs;
use crate::config::ManagerConfig;
use crate::environment::{Environment, FetchTask, TimerHandle};
use crate::errors::CycleError;
use crate::fetcher::fetch_latest_rollout;
use crate::metrics_defs::{
    FETCH_CYCLE_DURATION, FETCH_TIMER_ARMED, SNAPSHOT_CONFIGS, SNAPSHOT_DELIVERED,
};
use crate::throttle::FetchThrottle;
use crate::types::{RolloutId, RolloutSnapshot};
use parking_lot::Mutex;
use shared::counter;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Invoked with each snapshot whose every config was fetched in one cycle.
/// Never invoked on a failed or no-op cycle.
pub type SnapshotCallback = Box<dyn Fn(RolloutSnapshot) + Send + Sync>;

#[derive(Default)]
struct ControllerState {
    // Last rollout ID delivered to the consumer, or the injected baseline.
    current_rollout_id: String,
    // Most recent observed ID that differs from current and is undelivered.
    pending_rollout_id: String,
    // No new fetch is scheduled before this instant.
    next_fetch_deadline: Option<SystemTime>,
    // Armed one-shot timer, if any. At most one at a time.
    timer: Option<TimerHandle>,
    // A fetch cycle is between timer fire and completion.
    inflight: bool,
}

struct ManagerInner<E> {
    env: E,
    service_name: String,
    base_url: String,
    throttle: FetchThrottle,
    callback: SnapshotCallback,
    state: Mutex<ControllerState>,
}

/// Keeps the proxy's service configuration current with the rollouts the
/// control plane publishes. One instance per service name; lives for the
/// process. Cloning yields another handle to the same manager.
pub struct RolloutManager<E: Environment> {
    inner: Arc<ManagerInner<E>>,
}

impl<E: Environment> Clone for RolloutManager<E> {
    fn clone(&self) -> Self {
        RolloutManager {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Environment> RolloutManager<E> {
    pub fn new(config: ManagerConfig, env: E, callback: SnapshotCallback) -> Self {
        let mut state = ControllerState::default();
        if let Some(id) = &config.initial_rollout_id {
            state.current_rollout_id = id.clone();
        }

        RolloutManager {
            inner: Arc::new(ManagerInner {
                env,
                service_name: config.service_name,
                base_url: config.service_management_url.trim_end_matches('/').to_string(),
                throttle: FetchThrottle::new(Duration::from_secs(config.fetch_throttle_window_s)),
                callback,
                state: Mutex::new(state),
            }),
        }
    }

    /// Seeds the baseline rollout ID. Startup only; never arms a timer.
    pub fn set_current_rollout_id(&self, rollout_id: &str) {
        self.inner.state.lock().current_rollout_id = rollout_id.to_string();
    }

    pub fn current_rollout_id(&self) -> RolloutId {
        self.inner.state.lock().current_rollout_id.clone()
    }

    /// Notifies the manager that the control plane advertises `rollout_id`
    /// as of `observed_at`. The sole entry point for change detection.
    ///
    /// An observation of the current ID is a no-op. A new ID is recorded as
    /// pending; it schedules a fetch only when no timer is armed, no cycle
    /// is in flight, and `observed_at` has passed the throttle deadline.
    /// Inside the window the observation is dropped and the caller is
    /// expected to re-notify later.
    pub fn observe_rollout_id(&self, rollout_id: &str, observed_at: SystemTime) {
        let mut state = self.inner.state.lock();

        if rollout_id == state.current_rollout_id {
            return;
        }
        state.pending_rollout_id = rollout_id.to_string();

        // An armed timer fetches whichever ID is pending when it fires; an
        // in-flight cycle is followed by a fresh notification instead.
        if state.timer.is_some() || state.inflight {
            return;
        }

        if let Some(deadline) = state.next_fetch_deadline {
            if observed_at < deadline {
                tracing::debug!(rollout_id, "rollout change inside throttle window, deferring");
                return;
            }
        }

        let delay = self.inner.throttle.next_delay();
        state.next_fetch_deadline = Some(observed_at + self.inner.throttle.window());

        let weak = Arc::downgrade(&self.inner);
        let task: FetchTask = Box::pin(async move {
            // The manager may be torn down between arm and fire.
            if let Some(inner) = weak.upgrade() {
                run_cycle(inner).await;
            }
        });
        state.timer = Some(self.inner.env.schedule_fetch(delay, task));

        counter!(FETCH_TIMER_ARMED).increment(1);
        tracing::info!(
            rollout_id,
            delay_ms = delay.as_millis() as u64,
            "scheduled rollout fetch"
        );
    }

    /// Asks the control plane which rollout it currently advertises and runs
    /// the answer through [`observe_rollout_id`]. The daemon's probe loop
    /// calls this; the full weighted fetch stays behind the throttle window.
    ///
    /// [`observe_rollout_id`]: RolloutManager::observe_rollout_id
    pub async fn check_advertised_rollout(&self) -> Result<RolloutId, CycleError> {
        let rollout =
            fetch_latest_rollout(&self.inner.env, &self.inner.base_url, &self.inner.service_name)
                .await?;
        let observed_at = self.inner.env.now();
        self.observe_rollout_id(&rollout.rollout_id, observed_at);
        Ok(rollout.rollout_id)
    }
}

/// One end-to-end fetch cycle, run by the timer task.
async fn run_cycle<E: Environment>(inner: Arc<ManagerInner<E>>) {
    let target_rollout_id;
    {
        let mut state = inner.state.lock();
        state.timer = None;
        if state.inflight {
            return;
        }
        state.inflight = true;
        target_rollout_id = state.pending_rollout_id.clone();
    }
    tracing::debug!(pending_rollout_id = %target_rollout_id, "fetch timer fired");

    let started = Instant::now();
    let outcome = execute_cycle(&inner).await;
    let status = match &outcome {
        Ok(Some(_)) => "delivered",
        Ok(None) => "unchanged",
        Err(_) => "failure",
    };
    metrics::histogram!(FETCH_CYCLE_DURATION.name, "status" => status)
        .record(started.elapsed().as_secs_f64());

    let delivered = {
        let mut state = inner.state.lock();
        state.inflight = false;
        match outcome {
            Ok(Some(snapshot)) => {
                state.current_rollout_id = snapshot.rollout_id.clone();
                Some(snapshot)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "rollout fetch cycle failed, retrying on the next throttle window"
                );
                None
            }
        }
    };

    // Outside the state lock: the consumer may call back into the manager.
    if let Some(snapshot) = delivered {
        metrics::histogram!(SNAPSHOT_CONFIGS.name).record(snapshot.configs.len() as f64);
        counter!(SNAPSHOT_DELIVERED).increment(1);
        tracing::info!(
            rollout_id = %snapshot.rollout_id,
            configs = snapshot.configs.len(),
            "delivering rollout snapshot"
        );
        (inner.callback)(snapshot);
    }
}

async fn execute_cycle<E: Environment>(
    inner: &Arc<ManagerInner<E>>,
) -> Result<Option<RolloutSnapshot>, CycleError> {
    let rollout =
        fetch_latest_rollout(&inner.env, &inner.base_url, &inner.service_name).await?;

    let current = inner.state.lock().current_rollout_id.clone();
    if rollout.rollout_id == current {
        tracing::debug!(
            rollout_id = %rollout.rollout_id,
            "winning rollout matches the current one, nothing to fetch"
        );
        return Ok(None);
    }

    let configs = assemble_configs(
        &inner.env,
        &inner.base_url,
        &inner.service_name,
        &rollout.percentages,
    )
    .await?;

    Ok(Some(RolloutSnapshot {
        rollout_id: rollout.rollout_id,
        configs,
    }))
}
