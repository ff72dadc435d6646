// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
pub enum Unit {}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, gauge};

/// Registers descriptions for the fixture cache metrics.
/// Call once, after a recorder is installed.
pub fn describe_metrics() {
    describe_counter!(
        "fixture_cache_hits_total",
        Unit::Count,
        "Fixture loads served by restoring a cached snapshot, labeled by fixture."
    );
    describe_counter!(
        "fixture_cache_misses_total",
        Unit::Count,
        "Fixture loads that ran the setup function, labeled by fixture."
    );
    describe_counter!(
        "fixture_snapshots_pruned_total",
        Unit::Count,
        "Cached snapshots dropped because a restore rolled the node back past them."
    );
    describe_counter!(
        "fixture_snapshot_errors_total",
        Unit::Count,
        "Restores rejected by the node because the snapshot was no longer valid."
    );
    describe_gauge!(
        "fixture_cache_size",
        "Number of snapshot records currently held by the fixture cache."
    );
}

#[cfg_attr(not(feature = "observability"), allow(unused_variables))]
pub fn increment_cache_hit(fixture: &str) {
    counter!("fixture_cache_hits_total", 1, "fixture" => fixture.to_string());
}

#[cfg_attr(not(feature = "observability"), allow(unused_variables))]
pub fn increment_cache_miss(fixture: &str) {
    counter!("fixture_cache_misses_total", 1, "fixture" => fixture.to_string());
}

#[cfg_attr(not(feature = "observability"), allow(unused_variables))]
pub fn increment_snapshots_pruned(count: u64) {
    counter!("fixture_snapshots_pruned_total", count);
}

#[cfg_attr(not(feature = "observability"), allow(unused_variables))]
pub fn increment_snapshot_error(fixture: &str) {
    counter!("fixture_snapshot_errors_total", 1, "fixture" => fixture.to_string());
}

#[cfg_attr(not(feature = "observability"), allow(unused_variables))]
pub fn set_cache_size(size: f64) {
    gauge!("fixture_cache_size", size);
}
