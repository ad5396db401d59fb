//! Prometheus metrics for coordination operations.

use metrics::counter;

/// Metric names for coordination operations
pub mod names {
    pub const SCHEDULE_RUNS: &str = "coordination_schedule_runs_total";
    pub const EXCHANGES: &str = "coordination_exchanges_total";
    pub const REQUESTS_RESOLVED: &str = "coordination_requests_resolved_total";
    pub const TRAVEL_LOOKUPS: &str = "coordination_travel_lookups_total";
}

/// Record a scheduling-engine run
pub fn record_schedule_run(room_id: &str, placed: usize, unplaced: usize) {
    counter!(names::SCHEDULE_RUNS, "room_id" => room_id.to_string()).increment(1);
    if unplaced > 0 {
        tracing::warn!(room_id, placed, unplaced, "schedule run left members unplaced");
    }
}

/// Record an exchange outcome (immediate, auto_placed, needs_approval, rejected)
pub fn record_exchange(outcome: &'static str) {
    counter!(names::EXCHANGES, "outcome" => outcome).increment(1);
}

/// Record a request resolution (approved, rejected, cancelled, stale)
pub fn record_request_resolved(outcome: &'static str) {
    counter!(names::REQUESTS_RESOLVED, "outcome" => outcome).increment(1);
}

/// Record a travel lookup and how it was satisfied (cache, api, fallback)
pub fn record_travel_lookup(source: &'static str) {
    counter!(names::TRAVEL_LOOKUPS, "source" => source).increment(1);
}

/// Initialize the Prometheus metrics exporter
/// Returns a handle to the PrometheusBuilder that can be used to render metrics
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder")
}
