//! Logging and metrics bootstrap for test binaries.
//!
//! Library code only emits `tracing` events. Without the `observability` feature
//! they reach `env_logger` through the `log` bridge; with it, a JSON
//! `tracing-subscriber` formatter is installed and metrics go to a Prometheus recorder.

/// Install a logger. Safe to call from every test; only the first call wins.
#[cfg(not(feature = "observability"))]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Install a logger. Safe to call from every test; only the first call wins.
#[cfg(feature = "observability")]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().json().with_test_writer().try_init();
}

/// Install the Prometheus recorder and register metric descriptions.
///
/// The returned handle renders the current metrics in text exposition format.
#[cfg(feature = "observability")]
pub fn install_metrics_recorder(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    crate::metrics::describe_metrics();
    Ok(handle)
}
