use crate::types::ConfigId;
use http::StatusCode;
use thiserror::Error;

/// Network-level failure reported by the environment's HTTP port.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Everything that can go wrong inside one fetch cycle. All variants collapse
/// to the same outcome at the manager: no delivery, retry on the next
/// throttle window.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("control plane returned {0}")]
    HttpStatus(StatusCode),

    #[error("malformed control plane response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rollouts list is empty")]
    EmptyRollouts,

    #[error("service config {0} returned an empty body")]
    EmptyConfig(ConfigId),

    #[error("{failed} of {total} service config fetches failed")]
    PartialConfigFailure { failed: usize, total: usize },
}
