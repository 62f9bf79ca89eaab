pub mod metrics_defs;

/// Record a counter declared as a [`metrics_defs::MetricDef`].
///
/// ```ignore
/// counter!(SNAPSHOT_DELIVERED).increment(1);
/// ```
#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        ::metrics::counter!($def.name)
    };
}
