//! Metrics definitions for the rollout manager.

use shared::metrics_defs::{MetricDef, MetricType};

pub const FETCH_TIMER_ARMED: MetricDef = MetricDef {
    name: "rollout.fetch_timer.armed",
    metric_type: MetricType::Counter,
    description: "Number of one-shot fetch timers armed",
};

pub const FETCH_CYCLE_DURATION: MetricDef = MetricDef {
    name: "rollout.fetch_cycle.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a fetch cycle in seconds",
};

pub const SNAPSHOT_DELIVERED: MetricDef = MetricDef {
    name: "rollout.snapshot.delivered",
    metric_type: MetricType::Counter,
    description: "Number of fully assembled snapshots delivered to the consumer",
};

pub const SNAPSHOT_CONFIGS: MetricDef = MetricDef {
    name: "rollout.snapshot.configs",
    metric_type: MetricType::Histogram,
    description: "Number of service configs in a delivered snapshot",
};

// Every def above must also appear here; `gantry sync-metrics` renders this
// list into METRICS.md.
pub const ALL_METRICS: &[MetricDef] = &[
    FETCH_TIMER_ARMED,
    FETCH_CYCLE_DURATION,
    SNAPSHOT_DELIVERED,
    SNAPSHOT_CONFIGS,
];
