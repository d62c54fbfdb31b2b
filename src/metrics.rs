//! Prometheus metrics for the info service.
//!
//! Installs the exporter recorder once per process and registers the static
//! `app_info` gauge plus the request/storage counters. The /metrics route
//! renders the exposition text from the returned handle.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::debug;

// === Metric Name Constants ===

/// Static application-info gauge, labeled with version and build.
pub const METRIC_APP_INFO: &str = "app_info";
/// Requests handled, labeled with path and status.
pub const METRIC_REQUESTS: &str = "app_requests_total";
/// Counter-route hits.
pub const METRIC_COUNTER_HITS: &str = "app_counter_hits_total";
/// Payload files written via the write route.
pub const METRIC_FILES_WRITTEN: &str = "app_files_written_total";

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and register metric descriptions.
///
/// Idempotent: repeated calls return the handle installed by the first one,
/// so the version/build labels come from the first caller.
pub fn init_metrics(version: &str, build: &str) -> Result<PrometheusHandle, BuildError> {
    PROMETHEUS
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new().install_recorder()?;

            describe_gauge!(METRIC_APP_INFO, "Application information");
            describe_counter!(METRIC_REQUESTS, "Total number of requests handled");
            describe_counter!(METRIC_COUNTER_HITS, "Total number of counter increments");
            describe_counter!(METRIC_FILES_WRITTEN, "Total number of payload files written");

            gauge!(
                METRIC_APP_INFO,
                "version" => version.to_string(),
                "build" => build.to_string()
            )
            .set(1.0);

            debug!("Metrics initialized");
            Ok(handle)
        })
        .cloned()
}

/// Count one handled request.
pub fn inc_requests(path: &str, status: u16) {
    counter!(
        METRIC_REQUESTS,
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Count one counter-route increment.
pub fn inc_counter_hits() {
    counter!(METRIC_COUNTER_HITS).increment(1);
}

/// Count one written payload file.
pub fn inc_files_written() {
    counter!(METRIC_FILES_WRITTEN).increment(1);
}
