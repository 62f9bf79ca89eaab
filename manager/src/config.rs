use serde::Deserialize;

pub const DEFAULT_SERVICE_MANAGEMENT_URL: &str = "https://servicemanagement.googleapis.com/v1";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ManagerConfig {
    /// Service whose rollouts are tracked. One manager serves one service.
    pub service_name: String,

    /// Window over which random fetch delays are drawn.
    #[serde(default = "default_fetch_throttle_window_s")]
    pub fetch_throttle_window_s: u64,

    #[serde(default = "default_service_management_url")]
    pub service_management_url: String,

    /// Baseline rollout ID injected at startup, suppressing the first fetch
    /// when the proxy already knows which rollout it serves.
    #[serde(default)]
    pub initial_rollout_id: Option<String>,

    /// Interval of the daemon's rollout-ID probe loop.
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: u64,
}

fn default_fetch_throttle_window_s() -> u64 {
    300
}

fn default_service_management_url() -> String {
    DEFAULT_SERVICE_MANAGEMENT_URL.to_string()
}

fn default_poll_interval_s() -> u64 {
    60
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            service_name: String::new(),
            fetch_throttle_window_s: default_fetch_throttle_window_s(),
            service_management_url: default_service_management_url(),
            initial_rollout_id: None,
            poll_interval_s: default_poll_interval_s(),
        }
    }
}
