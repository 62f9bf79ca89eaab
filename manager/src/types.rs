use bytes::Bytes;

pub type RolloutId = String;
pub type ConfigId = String;

/// One service-config revision. The payload is opaque to the manager; it is
/// forwarded byte-for-byte as the control plane returned it.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    pub id: ConfigId,
    pub payload: Bytes,
}

/// A service config together with the share of traffic the winning rollout
/// assigns to it. Percent sums are passed through as published, never
/// normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedConfig {
    pub config: ServiceConfig,
    pub percent: u32,
}

/// The fully assembled bundle delivered to the consumer: every config the
/// winning rollout references, fetched in the same cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct RolloutSnapshot {
    pub rollout_id: RolloutId,
    pub configs: Vec<WeightedConfig>,
}
