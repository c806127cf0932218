//! Prometheus metrics for refresh outcomes.
//!
//! Every counter carries a `cache` label. Without an installed recorder the
//! calls are no-ops.

pub const REFRESH_SUCCESS: &str = "refresh_success_total";
pub const REFRESH_FAILURE: &str = "refresh_failure_total";
pub const REFRESH_TIMEOUT: &str = "refresh_timeout_total";
pub const REFRESH_OVERRUN: &str = "refresh_overrun_total";
pub const REFRESH_HANDLER_FAILURE: &str = "refresh_handler_failure_total";

const CACHE_LABEL: &str = "cache";

/// Adds a published snapshot.
pub fn inc_success(cache: &str) {
    ::metrics::counter!(REFRESH_SUCCESS, CACHE_LABEL => cache.to_owned()).increment(1);
}

/// Adds a failed refresh.
pub fn inc_failure(cache: &str) {
    ::metrics::counter!(REFRESH_FAILURE, CACHE_LABEL => cache.to_owned()).increment(1);
}

/// Adds a timed out refresh.
pub fn inc_timeout(cache: &str) {
    ::metrics::counter!(REFRESH_TIMEOUT, CACHE_LABEL => cache.to_owned()).increment(1);
}

/// Adds a skipped tick.
pub fn inc_overrun(cache: &str) {
    ::metrics::counter!(REFRESH_OVERRUN, CACHE_LABEL => cache.to_owned()).increment(1);
}

/// Adds a failed error handler invocation.
pub fn inc_handler_failure(cache: &str) {
    ::metrics::counter!(REFRESH_HANDLER_FAILURE, CACHE_LABEL => cache.to_owned()).increment(1);
}

/// Installs the Prometheus recorder with an HTTP scrape listener.
/// Must be called from within a tokio runtime.
pub fn init_prometheus_exporter(listen: std::net::SocketAddr) -> anyhow::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
}
