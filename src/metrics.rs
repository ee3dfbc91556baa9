use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register the dashboard metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only one global recorder can exist per process; later calls get a
/// detached handle instead of failing.
pub fn init_metrics() -> PrometheusHandle {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder already installed; using detached handle");
            return PrometheusBuilder::new().build_recorder().handle();
        }
    };

    // Pre-register counters so they appear even before the first increment.
    counter!("opportunity_loads_total").absolute(0);
    counter!("opportunity_load_failures_total").absolute(0);
    counter!("analysis_runs_total").absolute(0);
    counter!("analysis_run_failures_total").absolute(0);
    counter!("stale_detail_responses_total").absolute(0);
    counter!("stale_list_responses_total").absolute(0);

    gauge!("opportunities_in_store").set(0.0);
    gauge!("analysis_running").set(0.0);
    gauge!("backend_connected").set(0.0);

    handle
}
