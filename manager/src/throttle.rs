use rand::Rng;
use std::time::Duration;

/// Spreads fetch traffic from a fleet of proxies across a window so that a
/// freshly published rollout does not stampede the control plane.
#[derive(Clone, Debug)]
pub struct FetchThrottle {
    window: Duration,
}

impl FetchThrottle {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Draw the delay for the next fetch, near-uniform over the window.
    pub fn next_delay(&self) -> Duration {
        let window_ms = self.window.as_millis() as u64;
        if window_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..window_ms))
    }
}
